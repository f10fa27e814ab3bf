use crate::cli::RenderArgs;
use crate::query_file::QueryFile;
use sqlweave::{BuiltQuery, QbConfig, SqlQb, WeaveConfig};
use std::sync::Arc;

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    let query = QueryFile::load(&args.query)?;
    let built = render(&query, config, args.aggregate.as_ref())?;
    println!("{}", built.sql);
    println!("{}", serde_json::to_string(built.params())?);
    Ok(())
}

fn load_config(args: &RenderArgs) -> anyhow::Result<Arc<QbConfig>> {
    if !args.config_explicit && !args.config.exists() {
        return Ok(QbConfig::shared());
    }
    let config = WeaveConfig::load(&args.config)
        .map_err(|e| anyhow::anyhow!("failed to load config {}: {e}", args.config.display()))?;
    Ok(Arc::new(config.qb_config()))
}

fn render(
    query: &QueryFile,
    config: Arc<QbConfig>,
    aggregate: Option<&(String, String)>,
) -> anyhow::Result<BuiltQuery> {
    let qb = query.to_builder(config)?;
    let built = match aggregate {
        Some((func, column)) => qb.build_aggregate(func, column)?,
        None => qb.build()?,
    };
    Ok(built)
}
