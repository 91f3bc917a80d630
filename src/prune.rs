//! Partition pruner (spec.md §4.5): for each partitioned table, computes the
//! minimal file read set from the reading filters built by the classifier.

use crate::cast::{cast, Literal};
use crate::connector::Connection;
use crate::error::EngineError;
use crate::filter::{Connective, ReadingFilterEntry};
use crate::plan::Table;
use crate::schema::{SchemaDoc, TypedField};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Splits a partition-encoded basename (already stripped of extension and
/// leading table name by the caller) into its key→value segments, per
/// spec.md §3 "Partition file name".
fn partition_segments(basename: &str, table_name: &str) -> HashMap<String, String> {
    let rest = basename.strip_prefix(table_name).unwrap_or(basename);
    let mut out = HashMap::new();
    for seg in rest.split('-').filter(|s| !s.is_empty()) {
        if let Some((k, v)) = seg.split_once('=') {
            out.insert(k.to_string(), v.to_string());
        }
    }
    out
}

/// Computes the minimal set of data file basenames (without extension) that
/// must be read for `table`, given the reading filters that apply to it.
pub fn prune(
    table: &Table,
    partitions: &[TypedField],
    table_conn: &dyn Connection,
    reading_filters: &[ReadingFilterEntry],
) -> Result<Vec<String>, EngineError> {
    if partitions.is_empty() {
        return Ok(vec![table.name.clone()]);
    }

    let mut files_per_key: HashMap<String, HashSet<String>> = HashMap::new();
    for key in partitions {
        let key_filters: Vec<&ReadingFilterEntry> =
            reading_filters.iter().filter(|f| f.column_name == key.name).collect();

        let partition_files = table_conn.list_partition_files(&key.name)?;
        let mut value_to_files: HashMap<String, Vec<String>> = HashMap::new();
        for file in &partition_files {
            let segs = partition_segments(file, &table.name);
            if let Some(v) = segs.get(&key.name) {
                value_to_files.entry(v.clone()).or_default().push(file.clone());
            }
        }

        let mut raws: Vec<String> = value_to_files.keys().cloned().collect();
        raws.sort();
        let candidates: Vec<Literal> =
            raws.iter().map(|v| cast(v, key.ty)).collect::<Result<Vec<_>, _>>()?;

        // Filters on the same key fold left to right following the WHERE
        // clause's own AND/OR structure (spec.md §4.5 step 3): AND narrows
        // (intersect), OR widens (union). The first filter seeds the set.
        let surviving_idx: HashSet<usize> = if key_filters.is_empty() {
            (0..candidates.len()).collect()
        } else {
            let positions_for = |f: &ReadingFilterEntry| -> HashSet<usize> {
                f.filter
                    .apply(&candidates)
                    .iter()
                    .filter_map(|v| candidates.iter().position(|c| c == v))
                    .collect()
            };
            let mut iter = key_filters.iter();
            let mut acc = positions_for(iter.next().unwrap());
            for f in iter {
                let next = positions_for(f);
                acc = match f.connective {
                    Connective::And => acc.intersection(&next).cloned().collect(),
                    Connective::Or => acc.union(&next).cloned().collect(),
                };
            }
            acc
        };

        let mut files_for_key = HashSet::new();
        for idx in &surviving_idx {
            if let Some(files) = value_to_files.get(&raws[*idx]) {
                files_for_key.extend(files.iter().cloned());
            }
        }
        debug!(
            target: "morganadb::prune",
            "table '{}' key '{}': {} of {} partition values survive",
            table.name,
            key.name,
            surviving_idx.len(),
            raws.len()
        );
        files_per_key.insert(key.name.clone(), files_for_key);
    }

    let mut iter = files_per_key.values();
    let mut result = iter.next().cloned().unwrap_or_default();
    for set in iter {
        result = result.intersection(set).cloned().collect();
    }
    let mut result: Vec<String> = result.into_iter().collect();
    result.sort();
    Ok(result)
}

/// Looks up a table's declared partition keys from its schema.
pub fn partitions_of(schema: &SchemaDoc) -> &[TypedField] {
    match schema {
        SchemaDoc::Table { partitions, .. } => partitions,
        SchemaDoc::Database { .. } => &[],
    }
}
