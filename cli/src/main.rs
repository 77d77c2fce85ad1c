mod commands;
mod terminal;

use commands::{CommandLine, Commands, check, list, run};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.verbose, commands.quiet, commands.log_to_file.as_deref())?;
    print::banner(commands.no_banner, commands.quiet);

    let outcome = match commands.command {
        Commands::Run(args) => {
            print::header("running commands", commands.quiet);
            run::run(args, commands.quiet).await
        }
        Commands::Check(args) => {
            print::header("checking connectivity", commands.quiet);
            check::check(args, commands.quiet).await
        }
        Commands::List(args) => {
            print::header("inventory", commands.quiet);
            list::list(args)
        }
    };

    print::end_of_program();
    outcome
}
