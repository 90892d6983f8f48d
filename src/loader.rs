//! Parquet file loading utilities

use std::path::Path;

use log::info;
use parquet::arrow::ProjectionMask;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::algorithm::hierarchy::edges_from_record_batch;
use crate::config::HierarchyConfig;
use crate::error::Result;
use crate::error::util::safe_open_file;
use crate::models::ConceptEdge;

/// Read concept relationship edges from a parquet file
///
/// Only the ancestor, descendant and details columns named in `config` are
/// read from the file.
pub fn read_concept_edges(path: &Path, config: &HierarchyConfig) -> Result<Vec<ConceptEdge>> {
    let file = safe_open_file(path, "reading concept edges")?;
    let reader_builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let wanted = [
        config.ancestor_column.as_str(),
        config.descendant_column.as_str(),
        config.details_column.as_str(),
    ];
    let schema = reader_builder.schema();
    let indices = wanted
        .iter()
        .map(|name| schema.index_of(name))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let projection = ProjectionMask::roots(reader_builder.parquet_schema(), indices);
    let reader = reader_builder.with_projection(projection).build()?;

    let mut edges = Vec::new();
    for batch in reader {
        edges.extend(edges_from_record_batch(&batch?, config)?);
    }

    info!("Read {} concept edges from {}", edges.len(), path.display());
    Ok(edges)
}
