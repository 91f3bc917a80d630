//! CLI entry point: run a one-shot SELECT against a local/remote database
//! root, or start the HTTP invocation shim (spec.md §6), following the
//! teacher's banner-then-env-vars startup and `--query`/stdin flag parsing.

use std::env;
use std::io::{self, Read};

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tracing::info;
use tracing_subscriber::EnvFilter;

use morganadb::{codec, connector, engine};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} --query \"<SQL>\" [--root <db_root>]\n  {program} -q \"<SQL>\" [--root <db_root>]\n  {program} [--root <db_root>]    # reads query text from stdin\n  {program} --serve [--port <port>]   # start the HTTP invocation shim\n\nFlags:\n  --root <uri>        Database root (file://... or s3://...), default: current directory\n  -q, --query <SQL>    Run a one-shot query (from arg); if omitted, reads from stdin\n  --serve              Start the HTTP invocation shim instead of running a query\n  --port <port>        HTTP port for --serve (default: 7878)\n  -h, --help           Show this help"
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info")).unwrap();
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    let http_port = env::var("MORGANADB_HTTP_PORT").unwrap_or_else(|_| "7878".to_string());
    let db_root = env::var("MORGANADB_ROOT").unwrap_or_else(|_| ".".to_string());
    info!(target: "morganadb", "morganadb starting: RUST_LOG='{rust_log}', http_port={http_port}, db_root='{db_root}'");

    let mut args: Vec<String> = env::args().collect();
    let program = args.remove(0);

    let mut root: Option<String> = None;
    let mut query: Option<String> = None;
    let mut serve = false;
    let mut port: Option<String> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--root" => {
                if i + 1 >= args.len() {
                    eprintln!("--root requires a value");
                    print_usage(&program);
                    std::process::exit(2);
                }
                root = Some(args[i + 1].clone());
                i += 2;
                continue;
            }
            "--query" | "-q" => {
                if i + 1 >= args.len() {
                    eprintln!("--query requires a value");
                    print_usage(&program);
                    std::process::exit(2);
                }
                query = Some(args[i + 1].clone());
                i += 2;
                continue;
            }
            "--serve" => {
                serve = true;
                i += 1;
                continue;
            }
            "--port" => {
                if i + 1 >= args.len() {
                    eprintln!("--port requires a value");
                    print_usage(&program);
                    std::process::exit(2);
                }
                port = Some(args[i + 1].clone());
                i += 2;
                continue;
            }
            "-h" | "--help" => {
                print_usage(&program);
                return Ok(());
            }
            other => {
                eprintln!("unrecognized argument: {other}");
                print_usage(&program);
                std::process::exit(2);
            }
        }
    }

    if serve {
        let bind_port = port.unwrap_or(http_port);
        let addr = format!("0.0.0.0:{bind_port}");
        info!(target: "morganadb", "listening on {addr}");
        let listener = tokio::net::TcpListener::bind(&addr).await.context("binding HTTP listener")?;
        axum::serve(listener, morganadb::shim::router()).await.context("serving HTTP")?;
        return Ok(());
    }

    let root = root.unwrap_or(db_root);
    let query = match query {
        Some(q) => q,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).context("reading query from stdin")?;
            buf
        }
    };

    let conn = connector::connect(&root, connector::StorageOptions::new())?;
    let mut result = engine::select(conn.as_ref(), &query)?;
    let bytes = codec::write_default(&mut result.data)?;
    println!("{}", BASE64.encode(bytes));
    Ok(())
}
