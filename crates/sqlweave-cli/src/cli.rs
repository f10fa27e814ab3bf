use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum Command {
    Help,
    Render(RenderArgs),
}

#[derive(Debug, Clone)]
pub struct RenderArgs {
    pub config: PathBuf,
    /// Set when `--config` was given; a missing file is then an error.
    pub config_explicit: bool,
    /// `FN:COLUMN`, e.g. `COUNT_DISTINCT:color`.
    pub aggregate: Option<(String, String)>,
    pub query: PathBuf,
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1);
    let Some(first) = it.next() else {
        return Ok(Command::Help);
    };

    match first.as_str() {
        "-h" | "--help" | "help" => Ok(Command::Help),
        "render" => parse_render(it.map(|s| s.as_str())),
        _ => anyhow::bail!("unknown command: {first}"),
    }
}

fn parse_render<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from("sqlweave.toml");
    let mut config_explicit = false;
    let mut aggregate: Option<(String, String)> = None;
    let mut query: Option<PathBuf> = None;

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help),
            "--config" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--config requires a value");
                };
                config = PathBuf::from(v);
                config_explicit = true;
            }
            _ if token.starts_with("--config=") => {
                config = PathBuf::from(token.trim_start_matches("--config="));
                config_explicit = true;
            }
            "--aggregate" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--aggregate requires a value");
                };
                aggregate = Some(parse_aggregate(v)?);
            }
            _ if token.starts_with("--aggregate=") => {
                aggregate = Some(parse_aggregate(token.trim_start_matches("--aggregate="))?);
            }
            _ if token.starts_with('-') => anyhow::bail!("unknown option: {token}"),
            _ => {
                if query.is_some() {
                    anyhow::bail!("unexpected argument: {token}");
                }
                query = Some(PathBuf::from(token));
            }
        }
    }

    let Some(query) = query else {
        anyhow::bail!("missing query file (usage: sqlweave render <query.toml>)");
    };

    Ok(Command::Render(RenderArgs {
        config,
        config_explicit,
        aggregate,
        query,
    }))
}

fn parse_aggregate(raw: &str) -> anyhow::Result<(String, String)> {
    match raw.split_once(':') {
        Some((func, column)) if !func.is_empty() && !column.is_empty() => {
            Ok((func.to_string(), column.to_string()))
        }
        _ => anyhow::bail!("--aggregate expects FN:COLUMN, got '{raw}'"),
    }
}

pub fn print_help() {
    println!(
        "\
sqlweave - render parameterized MySQL statements from query files

USAGE:
  sqlweave render [OPTIONS] <QUERY_FILE>
  sqlweave help

RENDER OPTIONS:
  --config <FILE>         Config file path (default: sqlweave.toml, used if present)
  --aggregate <FN:COLUMN> Render the aggregate form, e.g. COUNT_DISTINCT:color
  -h, --help              Print help

The SQL is printed on the first line, the JSON array of params on the second."
    );
}
