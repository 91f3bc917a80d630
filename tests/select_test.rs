//! End-to-end tests against a hand-built CSV database directory, covering
//! the literal scenarios and boundary properties from spec.md §8.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use morganadb::connector::{self, StorageOptions};
use morganadb::engine;

fn write(path: &Path, name: &str, contents: &str) {
    fs::write(path.join(name), contents).unwrap();
}

fn table_schema(name: &str, columns: &[(&str, &str)], partitions: &[(&str, &str)]) -> String {
    let cols = columns
        .iter()
        .map(|(n, t)| format!(r#"{{"name":"{n}","type":"{t}"}}"#))
        .collect::<Vec<_>>()
        .join(",");
    let parts = partitions
        .iter()
        .map(|(n, t)| format!(r#"{{"name":"{n}","type":"{t}"}}"#))
        .collect::<Vec<_>>()
        .join(",");
    format!(
        r#"{{"uri":"u","name":"{name}","schema_type":"table","format":"CSV","columns":[{cols}],"partition_keys":[{parts}]}}"#
    )
}

fn db_schema(tables: &[&str]) -> String {
    let refs = tables
        .iter()
        .map(|t| format!(r#"{{"name":"{t}","ref":"{t}"}}"#))
        .collect::<Vec<_>>()
        .join(",");
    format!(r#"{{"uri":"u","name":"db","schema_type":"database","tables":[{refs}]}}"#)
}

fn read_result_bytes(bytes: Vec<u8>) -> polars::prelude::DataFrame {
    morganadb::codec::parquet::read(Box::new(Cursor::new(bytes))).unwrap()
}

fn run(root: &Path, sql: &str) -> polars::prelude::DataFrame {
    let uri = morganadb::uri::path_to_uri(root, "file");
    let conn = connector::connect(&uri, StorageOptions::new()).unwrap();
    let mut result = engine::select(conn.as_ref(), sql).unwrap();
    let bytes = morganadb::codec::write_default(&mut result.data).unwrap();
    read_result_bytes(bytes)
}

fn run_with_files(root: &Path, sql: &str) -> (polars::prelude::DataFrame, Vec<String>) {
    let uri = morganadb::uri::path_to_uri(root, "file");
    let conn = connector::connect(&uri, StorageOptions::new()).unwrap();
    let mut result = engine::select(conn.as_ref(), sql).unwrap();
    let files = result.files_read.clone();
    let bytes = morganadb::codec::write_default(&mut result.data).unwrap();
    (read_result_bytes(bytes), files)
}

/// Scenario 1: unpartitioned table, numeric comparison filter.
#[test]
fn scenario_unpartitioned_numeric_filter() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    fs::create_dir_all(root.join("usinas")).unwrap();
    write(root, ".schema.json", &db_schema(&["usinas"]));
    write(
        root.join("usinas").as_path(),
        ".schema.json",
        &table_schema(
            "usinas",
            &[
                ("id", "int"),
                ("codigo", "string"),
                ("nome", "string"),
                ("capacidade_instalada", "float"),
            ],
            &[],
        ),
    );
    write(
        root.join("usinas").as_path(),
        "usinas.csv",
        "id,codigo,nome,capacidade_instalada\n1,U1,Usina Um,50.0\n2,U2,Usina Dois,150.0\n3,U3,Usina Tres,200.0\n",
    );

    let df = run(root, "SELECT id, codigo, nome, capacidade_instalada FROM usinas WHERE capacidade_instalada > 100");
    assert_eq!(df.height(), 2);
    let ids: Vec<i64> = df.column("id").unwrap().i64().unwrap().into_no_null_iter().collect();
    assert_eq!(ids, vec![2, 3]);
}

/// Scenario 3: partitioned table, reading filter prunes to a single file,
/// projected columns carry aliases, and the partition value is injected.
#[test]
fn scenario_partition_prune_and_alias() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let table_dir = root.join("usinas_part_subsis");
    fs::create_dir_all(&table_dir).unwrap();
    write(root, ".schema.json", &db_schema(&["usinas_part_subsis"]));
    write(
        &table_dir,
        ".schema.json",
        &table_schema(
            "usinas_part_subsis",
            &[("nome", "string")],
            &[("subsistema_geografico", "string")],
        ),
    );
    write(&table_dir, "usinas_part_subsis-subsistema_geografico=NE.csv", "nome\nAlpha\nBeta\n");
    write(&table_dir, "usinas_part_subsis-subsistema_geografico=SE.csv", "nome\nGamma\n");

    let df = run(
        root,
        "SELECT nome AS nome_usina, subsistema_geografico AS subsis FROM usinas_part_subsis WHERE subsis = 'NE'",
    );
    assert_eq!(df.height(), 2);
    assert_eq!(df.get_column_names(), vec!["nome_usina", "subsis"]);
    let subsis: Vec<&str> = df.column("subsis").unwrap().str().unwrap().into_no_null_iter().collect();
    assert!(subsis.iter().all(|v| *v == "NE"));
}

/// Scenario 4: inner join across two tables produces `col, col_alias` headers.
#[test]
fn scenario_inner_join_column_naming() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    fs::create_dir_all(root.join("usinas")).unwrap();
    fs::create_dir_all(root.join("usinas_part_subsis")).unwrap();
    write(root, ".schema.json", &db_schema(&["usinas", "usinas_part_subsis"]));
    write(
        root.join("usinas").as_path(),
        ".schema.json",
        &table_schema("usinas", &[("id", "int"), ("codigo", "string")], &[]),
    );
    write(root.join("usinas").as_path(), "usinas.csv", "id,codigo\n1,A1\n2,A2\n");
    write(
        root.join("usinas_part_subsis").as_path(),
        ".schema.json",
        &table_schema("usinas_part_subsis", &[("id", "int"), ("codigo", "string")], &[]),
    );
    write(root.join("usinas_part_subsis").as_path(), "usinas_part_subsis.csv", "id,codigo\n1,B1\n3,B3\n");

    let df = run(
        root,
        "SELECT id, up.id, codigo, up.codigo FROM usinas INNER JOIN usinas_part_subsis AS up ON usinas.id = up.id",
    );
    assert_eq!(df.height(), 1);
    assert_eq!(df.get_column_names(), vec!["id", "id_up", "codigo", "codigo_up"]);
}

/// Boundary: IN with a trailing comma matches the same rows as without.
#[test]
fn in_list_trailing_comma_matches_without() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    fs::create_dir_all(root.join("usinas")).unwrap();
    write(root, ".schema.json", &db_schema(&["usinas"]));
    write(root.join("usinas").as_path(), ".schema.json", &table_schema("usinas", &[("id", "int")], &[]));
    write(root.join("usinas").as_path(), "usinas.csv", "id\n1\n2\n3\n");

    let with_comma = run(root, "SELECT id FROM usinas WHERE id IN (1,)");
    let without_comma = run(root, "SELECT id FROM usinas WHERE id IN (1)");
    assert_eq!(with_comma.height(), without_comma.height());
    assert_eq!(with_comma.height(), 1);
}

/// Boundary: no WHERE clause performs no row filtering.
#[test]
fn where_absent_returns_all_rows() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    fs::create_dir_all(root.join("usinas")).unwrap();
    write(root, ".schema.json", &db_schema(&["usinas"]));
    write(root.join("usinas").as_path(), ".schema.json", &table_schema("usinas", &[("id", "int")], &[]));
    write(root.join("usinas").as_path(), "usinas.csv", "id\n1\n2\n3\n");

    let df = run(root, "SELECT id FROM usinas");
    assert_eq!(df.height(), 3);
}

/// Boundary: a reading filter that excludes every partition value yields an
/// empty table carrying the projected schema, not an error.
#[test]
fn empty_read_set_yields_empty_projected_table() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let table_dir = root.join("usinas_part_subsis");
    fs::create_dir_all(&table_dir).unwrap();
    write(root, ".schema.json", &db_schema(&["usinas_part_subsis"]));
    write(
        &table_dir,
        ".schema.json",
        &table_schema("usinas_part_subsis", &[("nome", "string")], &[("subsistema_geografico", "string")]),
    );
    write(&table_dir, "usinas_part_subsis-subsistema_geografico=NE.csv", "nome\nAlpha\n");

    let df = run(root, "SELECT nome FROM usinas_part_subsis WHERE subsistema_geografico = 'SE'");
    assert_eq!(df.height(), 0);
    assert_eq!(df.get_column_names(), vec!["nome"]);
}

/// A non-INNER join is recognized by the parser but rejected at execution.
#[test]
fn left_join_is_not_implemented_at_execution() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    fs::create_dir_all(root.join("usinas")).unwrap();
    fs::create_dir_all(root.join("usinas_part_subsis")).unwrap();
    write(root, ".schema.json", &db_schema(&["usinas", "usinas_part_subsis"]));
    write(root.join("usinas").as_path(), ".schema.json", &table_schema("usinas", &[("id", "int")], &[]));
    write(root.join("usinas").as_path(), "usinas.csv", "id\n1\n");
    write(
        root.join("usinas_part_subsis").as_path(),
        ".schema.json",
        &table_schema("usinas_part_subsis", &[("id", "int")], &[]),
    );
    write(root.join("usinas_part_subsis").as_path(), "usinas_part_subsis.csv", "id\n1\n");

    let uri = morganadb::uri::path_to_uri(root, "file");
    let conn = connector::connect(&uri, StorageOptions::new()).unwrap();
    let err = engine::select(
        conn.as_ref(),
        "SELECT id FROM usinas LEFT JOIN usinas_part_subsis AS up ON usinas.id = up.id",
    )
    .unwrap_err();
    assert_eq!(err.http_status(), 500);
}

/// Qualified vs. unqualified references to same-named columns across joined
/// tables resolve unambiguously and keep distinct output headers.
#[test]
fn qualified_and_unqualified_same_name_stay_distinct() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    fs::create_dir_all(root.join("usinas")).unwrap();
    fs::create_dir_all(root.join("usinas_part_subsis")).unwrap();
    write(root, ".schema.json", &db_schema(&["usinas", "usinas_part_subsis"]));
    write(
        root.join("usinas").as_path(),
        ".schema.json",
        &table_schema("usinas", &[("id", "int"), ("nome", "string")], &[]),
    );
    write(root.join("usinas").as_path(), "usinas.csv", "id,nome\n1,Um\n");
    write(
        root.join("usinas_part_subsis").as_path(),
        ".schema.json",
        &table_schema("usinas_part_subsis", &[("id", "int"), ("nome", "string")], &[]),
    );
    write(root.join("usinas_part_subsis").as_path(), "usinas_part_subsis.csv", "id,nome\n1,Ums\n");

    let df = run(
        root,
        "SELECT nome, up.nome FROM usinas INNER JOIN usinas_part_subsis AS up ON usinas.id = up.id",
    );
    assert_eq!(df.get_column_names(), vec!["nome", "nome_up"]);
    let left: Vec<&str> = df.column("nome").unwrap().str().unwrap().into_no_null_iter().collect();
    let right: Vec<&str> = df.column("nome_up").unwrap().str().unwrap().into_no_null_iter().collect();
    assert_eq!(left, vec!["Um"]);
    assert_eq!(right, vec!["Ums"]);
}

/// Scenario 2: `*` over a table partitioned by a column the filter does not
/// touch scans every partition file (no pruning) and filters on the
/// non-partition `data_rodada` column.
#[test]
fn scenario_star_with_non_partition_datetime_filter() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let table_dir = root.join("velocidade_vento_100m");
    fs::create_dir_all(&table_dir).unwrap();
    write(root, ".schema.json", &db_schema(&["velocidade_vento_100m"]));
    write(
        &table_dir,
        ".schema.json",
        &table_schema(
            "velocidade_vento_100m",
            &[("data_rodada", "datetime"), ("velocidade", "float")],
            &[("quadricula", "string")],
        ),
    );
    write(
        &table_dir,
        "velocidade_vento_100m-quadricula=Q1.csv",
        "data_rodada,velocidade\n2023-01-01T00:00:00+00:00,5.5\n2023-01-02T00:00:00+00:00,6.0\n",
    );
    write(
        &table_dir,
        "velocidade_vento_100m-quadricula=Q2.csv",
        "data_rodada,velocidade\n2023-01-01T00:00:00+00:00,7.0\n",
    );

    let (df, files) = run_with_files(
        root,
        "SELECT * FROM velocidade_vento_100m WHERE data_rodada = '2023-01-01T00:00:00+00:00'",
    );
    assert_eq!(files.len(), 2, "non-partition filter must not prune either partition file");
    assert_eq!(df.height(), 2);
}

/// Scenario 5: IN over a non-partition datetime column returns only the
/// matching rows.
#[test]
fn scenario_datetime_in_list() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let table_dir = root.join("velocidade_vento_100m");
    fs::create_dir_all(&table_dir).unwrap();
    write(root, ".schema.json", &db_schema(&["velocidade_vento_100m"]));
    write(
        &table_dir,
        ".schema.json",
        &table_schema(
            "velocidade_vento_100m",
            &[("data_rodada", "datetime"), ("velocidade", "float")],
            &[("quadricula", "string")],
        ),
    );
    write(
        &table_dir,
        "velocidade_vento_100m-quadricula=Q1.csv",
        "data_rodada,velocidade\n2023-01-01T00:00:00+00:00,5.5\n2023-01-02T00:00:00+00:00,6.0\n2023-01-03T00:00:00+00:00,6.5\n",
    );

    let df = run(
        root,
        "SELECT * FROM velocidade_vento_100m WHERE data_rodada IN ('2023-01-01T00:00:00+00:00', '2023-01-02T00:00:00+00:00')",
    );
    assert_eq!(df.height(), 2);
}

/// Scenario 6: NOT IN over a date column excludes exactly the listed dates.
#[test]
fn scenario_date_not_in_list() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    fs::create_dir_all(root.join("usinas")).unwrap();
    write(root, ".schema.json", &db_schema(&["usinas"]));
    write(
        root.join("usinas").as_path(),
        ".schema.json",
        &table_schema("usinas", &[("id", "int"), ("data_inicio_operacao", "date")], &[]),
    );
    write(
        root.join("usinas").as_path(),
        "usinas.csv",
        "id,data_inicio_operacao\n1,2020-01-01\n2,2020-01-02\n3,2020-01-03\n",
    );

    let df = run(root, "SELECT id FROM usinas WHERE data_inicio_operacao NOT IN ('2020-01-01','2020-01-02')");
    assert_eq!(df.height(), 1);
    let ids: Vec<i64> = df.column("id").unwrap().i64().unwrap().into_no_null_iter().collect();
    assert_eq!(ids, vec![3]);
}

/// Projecting the same column twice under different aliases keeps both
/// output columns instead of the second silently dropping the first.
#[test]
fn duplicate_column_projected_under_two_aliases() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    fs::create_dir_all(root.join("usinas")).unwrap();
    write(root, ".schema.json", &db_schema(&["usinas"]));
    write(root.join("usinas").as_path(), ".schema.json", &table_schema("usinas", &[("id", "int")], &[]));
    write(root.join("usinas").as_path(), "usinas.csv", "id\n1\n2\n");

    let df = run(root, "SELECT id, id AS other_id FROM usinas");
    assert_eq!(df.get_column_names(), vec!["id", "other_id"]);
    let left: Vec<i64> = df.column("id").unwrap().i64().unwrap().into_no_null_iter().collect();
    let right: Vec<i64> = df.column("other_id").unwrap().i64().unwrap().into_no_null_iter().collect();
    assert_eq!(left, right);
    assert_eq!(left, vec![1, 2]);
}

/// `SELECT <cols> FROM t` yields the same rows as `SELECT * FROM t`
/// projected to those columns (round-trip property).
#[test]
fn explicit_projection_matches_star_projected() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    fs::create_dir_all(root.join("usinas")).unwrap();
    write(root, ".schema.json", &db_schema(&["usinas"]));
    write(
        root.join("usinas").as_path(),
        ".schema.json",
        &table_schema("usinas", &[("id", "int"), ("nome", "string")], &[]),
    );
    write(root.join("usinas").as_path(), "usinas.csv", "id,nome\n1,Um\n2,Dois\n");

    let explicit = run(root, "SELECT id FROM usinas");
    let star = run(root, "SELECT * FROM usinas");
    let star_ids: Vec<i64> =
        star.column("id").unwrap().i64().unwrap().into_no_null_iter().collect();
    let explicit_ids: Vec<i64> =
        explicit.column("id").unwrap().i64().unwrap().into_no_null_iter().collect();
    assert_eq!(explicit_ids, star_ids);
}
