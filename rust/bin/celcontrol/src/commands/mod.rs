pub mod context;
pub mod device;
pub mod report;
pub mod sale;

use std::path::Path;

use anyhow::Result;
use tracing::{debug, warn};

use stock::{StockService, WorkflowOptions};

use crate::config::{ClientConfig, Context};

/// Output format selected with `-o`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Output {
    Table,
    Json,
}

/// Everything a stock command needs: the resolved context and its service.
pub struct Session {
    pub context: Context,
    pub service: StockService,
    pub output: Output,
}

impl Session {
    pub fn open(
        client_config_path: &Path,
        context: Option<&str>,
        output: Output,
    ) -> Result<Self> {
        let config = ClientConfig::load(client_config_path)?;
        let context = config.resolve(context)?.clone();
        debug!("using context {} ({})", context.name, context.store.describe());

        let gateway = stock::gateway::open(&context.store)?;
        Ok(Self {
            context,
            service: StockService::new(gateway),
            output,
        })
    }

    pub fn with_options(mut self, options: WorkflowOptions) -> Self {
        self.service = self.service.with_options(options);
        self
    }

    pub fn json(&self) -> bool {
        self.output == Output::Json
    }
}

/// Reload the snapshot after a write and print the stock line.
///
/// The write already succeeded, so a failed reload is only logged.
pub fn print_refreshed_stock(session: &Session) {
    match session.service.load_view() {
        Ok(view) => {
            let summary = view.summary();
            println!(
                "Stock: {} available, {} sold.",
                summary.available, summary.sold
            );
        }
        Err(e) => warn!("could not reload stock after write: {e}"),
    }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Trim a cell to `width` characters for table output.
pub fn cell(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}
