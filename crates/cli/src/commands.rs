use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Submit a query and follow it to completion, printing all result rows
    Run {
        #[arg(long, help = "Data scope (catalog/database) to query")]
        scope: String,

        #[arg(long, help = "SQL query text")]
        query: String,

        #[arg(
            long,
            help = "Query API endpoint; falls back to the SIFT_ENDPOINT environment variable"
        )]
        endpoint: Option<String>,

        #[arg(
            long,
            help = "Poll interval in milliseconds while the job is in flight"
        )]
        interval_ms: Option<u64>,

        #[arg(long, help = "Print result rows as a JSON array instead of JSON lines")]
        json: bool,
    },
    /// Reattach to a session from its locator and follow it to completion
    Resume {
        #[arg(
            long,
            help = "Session locator, e.g. \"scope=security_logs&job=q-42\"; \
                    falls back to the locally persisted session"
        )]
        locator: Option<String>,

        #[arg(long, help = "Query API endpoint; falls back to SIFT_ENDPOINT")]
        endpoint: Option<String>,

        #[arg(
            long,
            help = "Poll interval in milliseconds while the job is in flight"
        )]
        interval_ms: Option<u64>,

        #[arg(long, help = "Print result rows as a JSON array instead of JSON lines")]
        json: bool,
    },
    /// One-shot status check of a job named by a locator
    Status {
        #[arg(long, help = "Session locator carrying the job id")]
        locator: String,

        #[arg(long, help = "Query API endpoint; falls back to SIFT_ENDPOINT")]
        endpoint: Option<String>,
    },
    /// Request cancellation of a job named by a locator
    Cancel {
        #[arg(long, help = "Session locator carrying the job id")]
        locator: String,

        #[arg(long, help = "Query API endpoint; falls back to SIFT_ENDPOINT")]
        endpoint: Option<String>,
    },
    /// Show the locally persisted session identity, if any
    Last,
}
