mod cli;
mod client;
mod command;
mod config;
mod editor;
mod error;
mod logging;
mod render;
mod response;
mod route;
mod termination;

use termination::terminate;

fn main() {
    let app = cli::Cli::parsed();
    logging::init(app.verbose);
    terminate(run(&app), app.color);
}

fn run(app: &cli::Cli) -> error::Result<response::Action> {
    let settings = config::Config::load(app.config.as_deref())?;
    let mut editor = editor::PromptEditor::stdio();
    let plan = route::build(&app.descriptor, route::now(), &mut editor)?;
    let client = client::SensuApiClient::new(&settings)?;
    let response = client.send(&plan)?;
    response::interpret(response.status, app.descriptor.command(), &response.body)
}
