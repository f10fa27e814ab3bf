mod cli;
mod query_file;
mod render;

pub fn run(args: Vec<String>) -> anyhow::Result<()> {
    let cmd = cli::parse_args(&args)?;
    match cmd {
        cli::Command::Help => {
            cli::print_help();
            Ok(())
        }
        cli::Command::Render(args) => render::run(args),
    }
}
