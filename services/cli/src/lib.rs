mod cli;
mod commands;
mod infra;
mod render;

use list_hygiene::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
