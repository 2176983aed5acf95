//! When steps for ledger authority BDD scenarios.

use std::time::Duration;

use eyre::WrapErr;
use ledgerboard::board::domain::LedgerEvent;
use rstest_bdd_macros::when;

use super::world::{LedgerWorld, task_key};

#[when("the console refreshes")]
fn console_refreshes(world: &mut LedgerWorld) -> Result<(), eyre::Report> {
    let body = world
        .pending_snapshot
        .take()
        .ok_or_else(|| eyre::eyre!("missing pending snapshot in scenario world"))?;
    world
        .console
        .apply_snapshot(Ok(body))
        .wrap_err("apply snapshot")?;
    Ok(())
}

#[when("{elapsed_ms:u64} ms pass without a ledger event")]
fn time_passes(world: &mut LedgerWorld, elapsed_ms: u64) {
    world.clock.advance(Duration::from_millis(elapsed_ms));
    world.console.expire_actions();
}

#[when(r#"the ledger emits "{topic}" for task "{task_id}""#)]
fn ledger_emits(world: &mut LedgerWorld, topic: String, task_id: String) -> Result<(), eyre::Report> {
    let event = LedgerEvent::new(world.event_id().as_str(), topic).with_task(task_key(&task_id)?);
    world.console.handle_event(event);
    Ok(())
}

#[when(r#"the ledger moves task "{task_id}" to column "{column}""#)]
fn ledger_moves_task(
    world: &mut LedgerWorld,
    task_id: String,
    column: String,
) -> Result<(), eyre::Report> {
    let event = LedgerEvent::new(world.event_id().as_str(), "task.moved")
        .with_task(task_key(&task_id)?)
        .with_column(column);
    world.console.handle_event(event);
    Ok(())
}
