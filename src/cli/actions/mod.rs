pub mod server;

/// Actions dispatched from the CLI
#[derive(Debug)]
pub enum Action {
    Server { port: u16, dsn: String },
}
