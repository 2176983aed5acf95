//! Then steps for ledger authority BDD scenarios.

use ledgerboard::board::domain::{ActionId, TaskRecord};
use rstest_bdd_macros::then;

use super::world::{LedgerWorld, id_list, task_key};

fn find_task<'a>(world: &'a LedgerWorld, task_id: &str) -> Result<&'a TaskRecord, eyre::Report> {
    let key = task_key(task_id)?;
    world
        .console
        .task(&key)
        .ok_or_else(|| eyre::eyre!("task {task_id} is not on the board"))
}

#[then(r#"task "{task_id}" shows stage "{stage}" and status "{status}""#)]
fn task_shows(
    world: &LedgerWorld,
    task_id: String,
    stage: String,
    status: String,
) -> Result<(), eyre::Report> {
    let task = find_task(world, &task_id)?;
    let derived = world.console.derived(task);

    if derived.stage.as_str() != stage || derived.status.as_str() != status {
        return Err(eyre::eyre!(
            "expected {stage}/{status}, found {}/{}",
            derived.stage,
            derived.status
        ));
    }
    Ok(())
}

#[then(r#"action "{action_id}" is no longer pending"#)]
fn action_not_pending(world: &LedgerWorld, action_id: String) -> Result<(), eyre::Report> {
    if world
        .console
        .tracker()
        .is_pending(&ActionId::new(action_id.as_str()))
    {
        return Err(eyre::eyre!("action {action_id} is still pending"));
    }
    Ok(())
}

#[then(r#"exactly one failure notice with reason "{reason}" was sent"#)]
fn one_failure_notice(world: &LedgerWorld, reason: String) -> Result<(), eyre::Report> {
    let notices = world.notifier.notices();
    let [notice] = notices.as_slice() else {
        return Err(eyre::eyre!("expected one notice, found {}", notices.len()));
    };
    let actual = notice
        .failure_reason
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default();
    if notice.success || actual != reason {
        return Err(eyre::eyre!("expected failure '{reason}', found '{actual}'"));
    }
    Ok(())
}

#[then("exactly one success notice was sent")]
fn one_success_notice(world: &LedgerWorld) -> Result<(), eyre::Report> {
    let notices = world.notifier.notices();
    match notices.as_slice() {
        [notice] if notice.success => Ok(()),
        other => Err(eyre::eyre!("expected one success notice, found {other:?}")),
    }
}

#[then(r#"the board holds exactly tasks "{ids}""#)]
fn board_holds_exactly(world: &LedgerWorld, ids: String) -> Result<(), eyre::Report> {
    let expected = id_list(&ids);
    let actual: Vec<String> = world
        .console
        .tasks()
        .iter()
        .map(|task| task.id().as_str().to_owned())
        .collect();
    if actual != expected {
        return Err(eyre::eyre!("expected {expected:?}, found {actual:?}"));
    }
    Ok(())
}

#[then(r#"task "{task_id}" has no status override"#)]
fn no_status_override(world: &LedgerWorld, task_id: String) -> Result<(), eyre::Report> {
    let key = task_key(&task_id)?;
    if let Some(status) = world.console.overrides_for(&key).status {
        return Err(eyre::eyre!("status override {status} survived"));
    }
    Ok(())
}
