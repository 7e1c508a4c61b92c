//! ASCII grid writer
//!
//! Writes a [`GridHeader`] and a [`Raster`] in either dialect. Output is plain
//! `std::io::Write`, so a file, a `Vec<u8>` or a [`RandomAccessStream`] can
//! be the target.
//!
//! [`RandomAccessStream`]: crate::io::RandomAccessStream

use std::io::Write;
use crate::error::{Error, Result};
use crate::types::Raster;
use super::header::{GridFormat, GridHeader};
use super::lexer::GRASS_NODATA_MARKER;

pub struct AsciiGridWriter<W: Write> {
    writer: W,
}

impl<W: Write> AsciiGridWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes the header lines for `header.format`
    pub fn write_header(&mut self, header: &GridHeader) -> Result<()> {
        match header.format {
            GridFormat::Esri => self.write_esri_header(header),
            GridFormat::Grass => self.write_grass_header(header),
        }
    }

    fn write_esri_header(&mut self, header: &GridHeader) -> Result<()> {
        let w = &mut self.writer;
        writeln!(w, "ncols {}", header.ncols)?;
        writeln!(w, "nrows {}", header.nrows)?;
        let x_key = if header.x_is_corner { "xllcorner" } else { "xllcenter" };
        let y_key = if header.y_is_corner { "yllcorner" } else { "yllcenter" };
        writeln!(w, "{} {}", x_key, header.xll)?;
        writeln!(w, "{} {}", y_key, header.yll)?;
        if header.cellsize_x == header.cellsize_y {
            writeln!(w, "cellsize {}", header.cellsize_x)?;
        } else {
            writeln!(w, "dx {}", header.cellsize_x)?;
            writeln!(w, "dy {}", header.cellsize_y)?;
        }
        if let Some(nodata) = header.nodata {
            writeln!(w, "NODATA_value {}", nodata)?;
        }
        Ok(())
    }

    fn write_grass_header(&mut self, header: &GridHeader) -> Result<()> {
        let (west, south, east, north) = header.bounding_box();
        let w = &mut self.writer;
        writeln!(w, "north: {}", north)?;
        writeln!(w, "south: {}", south)?;
        writeln!(w, "east: {}", east)?;
        writeln!(w, "west: {}", west)?;
        writeln!(w, "rows: {}", header.nrows)?;
        writeln!(w, "cols: {}", header.ncols)?;
        Ok(())
    }

    /// Writes the samples of `raster`, one grid row per line
    ///
    /// NoData samples (NaN or the header's NoData value) become `*` in GRASS
    /// output and the NoData value in ESRI output.
    pub fn write_samples(&mut self, header: &GridHeader, raster: &Raster) -> Result<()> {
        for y in 0..raster.height() {
            for (x, &value) in raster.row(y).iter().enumerate() {
                if x > 0 {
                    self.writer.write_all(b" ")?;
                }
                self.write_value(header, value)?;
            }
            self.writer.write_all(b"\n")?;
        }
        Ok(())
    }

    fn write_value(&mut self, header: &GridHeader, value: f64) -> Result<()> {
        if value.is_infinite() {
            return Err(Error::InvalidFormat(format!(
                "{} cannot hold the sample {}",
                header.format.name(),
                value
            )));
        }
        if header.is_nodata(value) {
            return match header.format {
                GridFormat::Grass => Ok(self.writer.write_all(&[GRASS_NODATA_MARKER])?),
                GridFormat::Esri => Ok(write!(self.writer, "{}", header.nodata_value())?),
            };
        }
        write!(self.writer, "{}", value)?;
        Ok(())
    }

    /// Writes a complete grid; `raster` must match the header dimensions
    pub fn write_grid(&mut self, header: &GridHeader, raster: &Raster) -> Result<()> {
        if raster.width() != header.ncols || raster.height() != header.nrows {
            return Err(Error::OutOfBounds(format!(
                "raster is {}x{} but the header declares {}x{}",
                raster.width(),
                raster.height(),
                header.ncols,
                header.nrows
            )));
        }
        self.write_header(header)?;
        self.write_samples(header, raster)?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::RandomAccessStream;

    fn esri_header() -> GridHeader {
        GridHeader {
            format: GridFormat::Esri,
            ncols: 2,
            nrows: 2,
            xll: 0.0,
            yll: 0.0,
            cellsize_x: 1.0,
            cellsize_y: 1.0,
            x_is_corner: true,
            y_is_corner: true,
            nodata: Some(-9999.0),
            data_offset: 0,
        }
    }

    fn sample_raster() -> Raster {
        let mut raster = Raster::new(2, 2, 0.0);
        raster.set(0, 0, 1.5);
        raster.set(1, 0, f64::NAN);
        raster.set(0, 1, -2.0);
        raster.set(1, 1, 4.0);
        raster
    }

    #[test]
    fn test_write_esri() {
        let mut writer = AsciiGridWriter::new(Vec::new());
        writer.write_grid(&esri_header(), &sample_raster()).unwrap();
        let text = String::from_utf8(writer.into_inner()).unwrap();

        assert_eq!(
            text,
            "ncols 2\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 1\nNODATA_value -9999\n1.5 -9999\n-2 4\n"
        );
    }

    #[test]
    fn test_write_grass_round_trip() {
        let header = GridHeader {
            format: GridFormat::Grass,
            nodata: None,
            xll: 10.0,
            yll: 20.0,
            cellsize_x: 5.0,
            cellsize_y: 2.5,
            ..esri_header()
        };
        let mut writer = AsciiGridWriter::new(Vec::new());
        writer.write_grid(&header, &sample_raster()).unwrap();
        let bytes = writer.into_inner();
        assert!(String::from_utf8_lossy(&bytes).contains("1.5 *\n"));

        let mut stream = RandomAccessStream::from_bytes("grass", bytes);
        let parsed = GridHeader::detect(&mut stream).unwrap();
        assert_eq!(parsed.format, GridFormat::Grass);
        assert_eq!(parsed.bounding_box(), header.bounding_box());
        assert_eq!(parsed.cellsize_x, 5.0);
        assert_eq!(parsed.cellsize_y, 2.5);
    }

    #[test]
    fn test_write_center_and_dx_dy() {
        let header = GridHeader {
            x_is_corner: false,
            cellsize_y: 2.0,
            nodata: None,
            ..esri_header()
        };
        let mut writer = AsciiGridWriter::new(Vec::new());
        writer.write_header(&header).unwrap();
        let text = String::from_utf8(writer.into_inner()).unwrap();

        assert!(text.contains("xllcenter 0\nyllcorner 0\n"));
        assert!(text.contains("dx 1\ndy 2\n"));
        assert!(!text.contains("NODATA"));
    }

    #[test]
    fn test_write_grass_marks_numeric_nodata() {
        let header = GridHeader {
            format: GridFormat::Grass,
            ..esri_header()
        };
        let mut raster = sample_raster();
        raster.set(1, 1, -9999.0);

        let mut writer = AsciiGridWriter::new(Vec::new());
        writer.write_samples(&header, &raster).unwrap();
        let text = String::from_utf8(writer.into_inner()).unwrap();

        assert_eq!(text, "1.5 *\n-2 *\n");
    }

    #[test]
    fn test_write_rejects_mismatch_and_infinity() {
        let mut writer = AsciiGridWriter::new(Vec::new());
        let err = writer.write_grid(&esri_header(), &Raster::new(3, 2, 0.0)).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds(_)));

        let mut raster = sample_raster();
        raster.set(0, 0, f64::INFINITY);
        let err = writer.write_grid(&esri_header(), &raster).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }
}
