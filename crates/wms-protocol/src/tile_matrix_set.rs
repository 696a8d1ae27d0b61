//! Import of a zoom table from a WMTS `<TileMatrixSet>` document.
//!
//! Each `<TileMatrix>` directly under a `<TileMatrixSet>` becomes one zoom
//! level, numbered in document order. Namespaces are ignored.

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;
use wmts_common::tile::{cell_size_from_scale, ZoomLevel, ZoomTable};

#[derive(Debug, Error)]
pub enum TileMatrixSetError {
    #[error("XML parsing error at position {position}: {source}")]
    Xml {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },

    #[error("TileMatrix {0} has no ScaleDenominator")]
    MissingScaleDenominator(u32),

    #[error("Invalid number in <{element}>: {value}")]
    InvalidNumber { element: String, value: String },

    #[error("No TileMatrix found in document")]
    Empty,
}

#[derive(Debug, Default)]
struct PartialMatrix {
    scale_denominator: Option<f64>,
    matrix_width: Option<f64>,
    matrix_height: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
enum Field {
    ScaleDenominator,
    MatrixWidth,
    MatrixHeight,
}

impl Field {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"ScaleDenominator" => Some(Field::ScaleDenominator),
            b"MatrixWidth" => Some(Field::MatrixWidth),
            b"MatrixHeight" => Some(Field::MatrixHeight),
            _ => None,
        }
    }

    fn element(&self) -> &'static str {
        match self {
            Field::ScaleDenominator => "ScaleDenominator",
            Field::MatrixWidth => "MatrixWidth",
            Field::MatrixHeight => "MatrixHeight",
        }
    }
}

fn parent_is(stack: &[Vec<u8>], name: &[u8]) -> bool {
    stack.last().is_some_and(|parent| parent.as_slice() == name)
}

/// Parse the zoom table of the first `<TileMatrixSet>` holding tile matrices.
///
/// Cell sizes are derived from the scale denominator with the OGC 0.28 mm
/// reference pixel.
pub fn parse_zoom_table(xml: &str) -> Result<ZoomTable, TileMatrixSetError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut current: Option<PartialMatrix> = None;
    let mut field: Option<Field> = None;
    let mut table = ZoomTable::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.local_name().as_ref().to_vec();
                if name == b"TileMatrix" && parent_is(&stack, b"TileMatrixSet") {
                    current = Some(PartialMatrix::default());
                } else if current.is_some() && parent_is(&stack, b"TileMatrix") {
                    field = Field::from_local_name(&name);
                }
                stack.push(name);
            }
            Ok(Event::Text(t)) => {
                if let (Some(f), Some(matrix)) = (field, current.as_mut()) {
                    let text = t.unescape().map_err(|source| TileMatrixSetError::Xml {
                        position: reader.buffer_position(),
                        source,
                    })?;
                    let value: f64 = text.trim().parse().map_err(|_| {
                        TileMatrixSetError::InvalidNumber {
                            element: f.element().to_string(),
                            value: text.to_string(),
                        }
                    })?;
                    match f {
                        Field::ScaleDenominator => matrix.scale_denominator = Some(value),
                        Field::MatrixWidth => matrix.matrix_width = Some(value),
                        Field::MatrixHeight => matrix.matrix_height = Some(value),
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name = e.local_name();
                field = None;
                stack.pop();

                if name.as_ref() == b"TileMatrix" {
                    if let Some(matrix) = current.take() {
                        let zoom = table.len() as u32;
                        let scale = matrix
                            .scale_denominator
                            .ok_or(TileMatrixSetError::MissingScaleDenominator(zoom))?;

                        table.insert(
                            zoom,
                            ZoomLevel {
                                cell_size: cell_size_from_scale(scale),
                                matrix_width: matrix.matrix_width,
                                matrix_height: matrix.matrix_height,
                                scale_denominator: Some(scale),
                            },
                        );
                    }
                } else if name.as_ref() == b"TileMatrixSet" && !table.is_empty() {
                    break;
                }
            }
            Ok(Event::Eof) => break,
            Err(source) => {
                return Err(TileMatrixSetError::Xml {
                    position: reader.buffer_position(),
                    source,
                })
            }
            _ => {}
        }
        buf.clear();
    }

    if table.is_empty() {
        return Err(TileMatrixSetError::Empty);
    }
    Ok(table)
}
