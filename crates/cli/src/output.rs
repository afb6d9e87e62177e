use crate::error::CliError;
use job_client::api::JobPoll;
use model::session::QuerySession;
use serde_json::json;
use session_core::persist::SessionIdentity;

/// Print accumulated rows, one JSON object per line, or as one JSON array.
pub fn print_rows(session: &QuerySession, as_array: bool) -> Result<(), CliError> {
    if as_array {
        println!("{}", serde_json::to_string_pretty(&session.rows)?);
        return Ok(());
    }
    for row in &session.rows {
        println!("{}", serde_json::to_string(row)?);
    }
    Ok(())
}

pub fn print_status(poll: &JobPoll) {
    println!("{:<10} {}", "Status", poll.status);
    if let Some(error) = &poll.error {
        println!("{:<10} {}", "Error", error);
    }
}

pub fn print_identity(identity: Option<&SessionIdentity>) -> Result<(), CliError> {
    match identity {
        Some(identity) => {
            let json = json!({
                "scope": identity.scope,
                "jobId": identity.job_id,
                "updatedAt": identity.updated_at.to_rfc3339(),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        None => println!("No persisted session"),
    }
    Ok(())
}
