//! ESRI and GRASS ASCII grid headers
//!
//! Both parsers leave the stream where they found it (success or failure) and
//! record the byte offset of the first sample in [`GridHeader::data_offset`].

use serde::Serialize;
use crate::error::{Error, Result};
use crate::io::{Backend, RandomAccessStream};
use crate::types::Dimensions;
use super::lexer::{is_separator, next_value, read_key, NumberLexer, GRASS_NODATA_MARKER};

/// Default ESRI NoData marker
pub const DEFAULT_NODATA: f64 = -9999.0;

/// Largest row or column count accepted
pub const MAX_GRID_SIZE: f64 = u32::MAX as f64;

/// Bytes scanned after the header looking for the first sample
const DATA_LOOKAHEAD: usize = 100;

const ESRI_MAX_KEY_LEN: usize = 14;
const ESRI_MAX_KEYS: usize = 8;
const GRASS_MAX_KEY_LEN: usize = 8;
const GRASS_KEYS: [&str; 6] = ["NORTH:", "SOUTH:", "EAST:", "WEST:", "ROWS:", "COLS:"];

/// ASCII grid dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GridFormat {
    /// ESRI / ArcInfo ASCII grid
    Esri,
    /// GRASS ASCII grid
    Grass,
}

impl GridFormat {
    pub fn name(&self) -> &'static str {
        match self {
            GridFormat::Esri => "ESRI ASCII Grid",
            GridFormat::Grass => "GRASS ASCII Grid",
        }
    }
}

/// Parsed grid header
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridHeader {
    pub format: GridFormat,
    pub ncols: usize,
    pub nrows: usize,
    /// X of the lower-left corner, or of the lower-left cell centre
    pub xll: f64,
    /// Y of the lower-left corner, or of the lower-left cell centre
    pub yll: f64,
    pub cellsize_x: f64,
    pub cellsize_y: f64,
    /// `true` for `XLLCORNER`, `false` for `XLLCENTER`
    pub x_is_corner: bool,
    /// `true` for `YLLCORNER`, `false` for `YLLCENTER`
    pub y_is_corner: bool,
    /// Explicit NoData value, if the header declared one
    pub nodata: Option<f64>,
    /// Byte offset of the first sample
    pub data_offset: u64,
}

impl GridHeader {
    /// Parses an ESRI header, trying GRASS when that fails
    pub fn detect<B: Backend>(stream: &mut RandomAccessStream<B>) -> Result<Self> {
        let header = match Self::parse_esri(stream) {
            Ok(header) => header,
            Err(Error::InvalidFormat(esri)) => match Self::parse_grass(stream) {
                Ok(header) => header,
                Err(Error::InvalidFormat(grass)) => {
                    return Err(Error::InvalidFormat(format!(
                        "{}: not an ESRI grid ({}) nor a GRASS grid ({})",
                        stream.location(),
                        esri,
                        grass
                    )))
                }
                Err(e) => return Err(e),
            },
            Err(e) => return Err(e),
        };

        log::debug!(
            "{}: {} {}x{}, data at {}",
            stream.location(),
            header.format.name(),
            header.ncols,
            header.nrows,
            header.data_offset
        );
        Ok(header)
    }

    /// Parses an ESRI header at the current position
    pub fn parse_esri<B: Backend>(stream: &mut RandomAccessStream<B>) -> Result<Self> {
        stream.mark();
        let result = read_esri(stream);
        stream.reset()?;
        result
    }

    /// Parses a GRASS header at the current position
    pub fn parse_grass<B: Backend>(stream: &mut RandomAccessStream<B>) -> Result<Self> {
        stream.mark();
        let result = read_grass(stream);
        stream.reset()?;
        result
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.ncols, self.nrows)
    }

    /// NoData marker in effect: the declared value, `-9999` for ESRI, NaN for GRASS
    pub fn nodata_value(&self) -> f64 {
        match (self.nodata, self.format) {
            (Some(value), _) => value,
            (None, GridFormat::Esri) => DEFAULT_NODATA,
            (None, GridFormat::Grass) => f64::NAN,
        }
    }

    /// Whether `value` marks a missing sample
    pub fn is_nodata(&self, value: f64) -> bool {
        value.is_nan() || value == self.nodata_value()
    }

    /// Lower-left corner of the grid, whichever key style each axis used
    pub fn lower_left_corner(&self) -> (f64, f64) {
        let x = if self.x_is_corner { self.xll } else { self.xll - self.cellsize_x / 2.0 };
        let y = if self.y_is_corner { self.yll } else { self.yll - self.cellsize_y / 2.0 };
        (x, y)
    }

    /// Bounding box as `(min_x, min_y, max_x, max_y)`
    pub fn bounding_box(&self) -> (f64, f64, f64, f64) {
        let (min_x, min_y) = self.lower_left_corner();
        (
            min_x,
            min_y,
            min_x + self.ncols as f64 * self.cellsize_x,
            min_y + self.nrows as f64 * self.cellsize_y,
        )
    }
}

fn header_value<B: Backend>(
    stream: &mut RandomAccessStream<B>,
    lexer: &mut NumberLexer,
    key: &str,
) -> Result<f64> {
    next_value(stream, lexer)?
        .ok_or_else(|| Error::InvalidFormat(format!("missing value for {}", key)))
}

fn grid_size(value: f64, key: &str) -> Result<usize> {
    if value.fract() != 0.0 || value < 1.0 || !value.is_finite() {
        return Err(Error::InvalidFormat(format!("{} must be a positive integer, got {}", key, value)));
    }
    if value > MAX_GRID_SIZE {
        return Err(Error::InvalidFormat(format!(
            "{} of {} exceeds the largest supported size {}",
            key, value, MAX_GRID_SIZE
        )));
    }
    Ok(value as usize)
}

/// Finds the first sample byte within [`DATA_LOOKAHEAD`] bytes
fn find_data_start<B: Backend>(stream: &mut RandomAccessStream<B>) -> Result<u64> {
    for _ in 0..DATA_LOOKAHEAD {
        match stream.read_byte()? {
            Some(b) if is_separator(b) => continue,
            Some(b) if b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.' | GRASS_NODATA_MARKER) => {
                return Ok(stream.position() - 1);
            }
            Some(b) => {
                return Err(Error::InvalidFormat(format!(
                    "unexpected byte {:?} before the data section",
                    b as char
                )))
            }
            None => return Err(Error::InvalidFormat("no data section after header".to_string())),
        }
    }
    Err(Error::InvalidFormat(format!(
        "no data found within {} bytes after the header",
        DATA_LOOKAHEAD
    )))
}

#[derive(Default)]
struct EsriFields {
    ncols: Option<f64>,
    nrows: Option<f64>,
    xll: Option<(f64, bool)>,
    yll: Option<(f64, bool)>,
    cellsize: Option<f64>,
    dx: Option<f64>,
    dy: Option<f64>,
    nodata: Option<f64>,
}

impl EsriFields {
    fn cell_size(&self) -> Option<(f64, f64)> {
        match (self.cellsize, self.dx, self.dy) {
            (Some(size), _, _) => Some((size, size)),
            (None, Some(dx), Some(dy)) => Some((dx, dy)),
            _ => None,
        }
    }

    fn count(&self) -> usize {
        [
            self.ncols.is_some(),
            self.nrows.is_some(),
            self.xll.is_some(),
            self.yll.is_some(),
            self.cell_size().is_some(),
            self.nodata.is_some(),
        ]
        .iter()
        .filter(|&&present| present)
        .count()
    }
}

fn read_esri<B: Backend>(stream: &mut RandomAccessStream<B>) -> Result<GridHeader> {
    let mut lexer = NumberLexer::new();
    let mut fields = EsriFields::default();

    for _ in 0..ESRI_MAX_KEYS {
        if fields.count() == 6 {
            break;
        }
        let key_start = stream.position();
        let key = read_key(stream, ESRI_MAX_KEY_LEN, None)?.to_ascii_uppercase();
        match key.as_str() {
            "NCOLS" => fields.ncols = Some(header_value(stream, &mut lexer, &key)?),
            "NROWS" => fields.nrows = Some(header_value(stream, &mut lexer, &key)?),
            "XLLCORNER" => fields.xll = Some((header_value(stream, &mut lexer, &key)?, true)),
            "XLLCENTER" => fields.xll = Some((header_value(stream, &mut lexer, &key)?, false)),
            "YLLCORNER" => fields.yll = Some((header_value(stream, &mut lexer, &key)?, true)),
            "YLLCENTER" => fields.yll = Some((header_value(stream, &mut lexer, &key)?, false)),
            "CELLSIZE" => fields.cellsize = Some(header_value(stream, &mut lexer, &key)?),
            "DX" => fields.dx = Some(header_value(stream, &mut lexer, &key)?),
            "DY" => fields.dy = Some(header_value(stream, &mut lexer, &key)?),
            "NODATA_VALUE" => fields.nodata = Some(header_value(stream, &mut lexer, &key)?),
            _ => {
                stream.seek(key_start)?;
                break;
            }
        }
    }

    if fields.count() < 5 {
        return Err(Error::InvalidFormat(format!(
            "ESRI header needs at least 5 of its 6 fields, found {}",
            fields.count()
        )));
    }

    let missing = |name: &str| Error::InvalidFormat(format!("ESRI header is missing {}", name));
    let ncols = grid_size(fields.ncols.ok_or_else(|| missing("NCOLS"))?, "NCOLS")?;
    let nrows = grid_size(fields.nrows.ok_or_else(|| missing("NROWS"))?, "NROWS")?;
    let (xll, x_corner) = fields.xll.ok_or_else(|| missing("XLLCORNER"))?;
    let (yll, y_corner) = fields.yll.ok_or_else(|| missing("YLLCORNER"))?;
    let (cellsize_x, cellsize_y) = fields.cell_size().ok_or_else(|| missing("CELLSIZE"))?;

    let data_offset = find_data_start(stream)?;

    Ok(GridHeader {
        format: GridFormat::Esri,
        ncols,
        nrows,
        xll,
        yll,
        cellsize_x,
        cellsize_y,
        x_is_corner: x_corner,
        y_is_corner: y_corner,
        nodata: fields.nodata,
        data_offset,
    })
}

fn read_grass<B: Backend>(stream: &mut RandomAccessStream<B>) -> Result<GridHeader> {
    let mut lexer = NumberLexer::new();
    let mut values = [0f64; 6];

    for (slot, expected) in values.iter_mut().zip(GRASS_KEYS) {
        let key = read_key(stream, GRASS_MAX_KEY_LEN, Some(b':'))?.to_ascii_uppercase();
        if key != expected {
            return Err(Error::InvalidFormat(format!(
                "GRASS header expected {}, found {:?}",
                expected, key
            )));
        }
        *slot = header_value(stream, &mut lexer, expected)?;
    }

    let [north, south, east, west, rows, cols] = values;
    let nrows = grid_size(rows, "ROWS:")?;
    let ncols = grid_size(cols, "COLS:")?;

    let data_offset = find_data_start(stream)?;

    Ok(GridHeader {
        format: GridFormat::Grass,
        ncols,
        nrows,
        xll: west,
        yll: south,
        cellsize_x: (east - west) / ncols as f64,
        cellsize_y: (north - south) / nrows as f64,
        x_is_corner: true,
        y_is_corner: true,
        nodata: None,
        data_offset,
    })
}
