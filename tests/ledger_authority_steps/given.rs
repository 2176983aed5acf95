//! Given steps for ledger authority BDD scenarios.

use std::time::Duration;

use eyre::WrapErr;
use ledgerboard::board::domain::{ActionRequest, ActionType, OverrideField};
use rstest_bdd_macros::given;
use serde_json::{Value, json};

use super::world::{LedgerWorld, id_list, task_key};

#[given(r#"a ledger snapshot with task "{task_id}" in stage "{stage}" and status "{status}""#)]
fn snapshot_with_staged_task(world: &mut LedgerWorld, task_id: String, stage: String, status: String) {
    world.pending_snapshot = Some(json!([
        { "id": task_id, "ledgerStage": stage, "rawStatus": status, "isTerminal": false }
    ]));
}

#[given(r#"a ledger snapshot with failed terminal task "{task_id}" and status "{status}""#)]
fn snapshot_with_failed_task(world: &mut LedgerWorld, task_id: String, status: String) {
    world.pending_snapshot = Some(json!([
        { "id": task_id, "rawStatus": status, "isTerminal": true, "terminalOutcome": "failed" }
    ]));
}

#[given(r#"a ledger snapshot with tasks "{ids}""#)]
fn snapshot_with_tasks(world: &mut LedgerWorld, ids: String) {
    let records: Vec<Value> = id_list(&ids)
        .into_iter()
        .map(|id| json!({ "id": id, "status": "running" }))
        .collect();
    world.pending_snapshot = Some(json!({ "items": records }));
}

#[given(r#"the board shows tasks "{ids}""#)]
fn board_shows_tasks(world: &mut LedgerWorld, ids: String) -> Result<(), eyre::Report> {
    let records: Vec<Value> = id_list(&ids)
        .into_iter()
        .map(|id| json!({ "id": id, "status": "running" }))
        .collect();
    world
        .console
        .apply_snapshot(Ok(Value::Array(records)))
        .wrap_err("seed the board with an initial snapshot")?;
    Ok(())
}

#[given(r#"a deploy action "{action_id}" for task "{task_id}" with a {timeout_ms:u64} ms timeout"#)]
fn deploy_action(
    world: &mut LedgerWorld,
    action_id: String,
    task_id: String,
    timeout_ms: u64,
) -> Result<(), eyre::Report> {
    let request = ActionRequest::new(ActionType::Deploy, task_id, "Deploy build")
        .with_id(action_id.as_str())
        .with_timeout(Duration::from_millis(timeout_ms));
    world
        .console
        .track_action(request)
        .wrap_err("register pending action")?;
    Ok(())
}

#[given(r#"the operator set status "{status}" on task "{task_id}""#)]
fn operator_set_status(
    world: &mut LedgerWorld,
    status: String,
    task_id: String,
) -> Result<(), eyre::Report> {
    let key = task_key(&task_id)?;
    if !world
        .console
        .set_override(&key, OverrideField::Status, Value::String(status))
    {
        return Err(eyre::eyre!("status override for {task_id} was not stored"));
    }
    Ok(())
}
