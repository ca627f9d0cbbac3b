//! Join-or-start transaction coordination.
//!
//! Backends expose their transaction state through [`TransactionContext`];
//! [`run_in_transaction`] is written once against it.

/// Transaction control over one store connection.
pub trait TransactionContext {
  type Error;

  /// Whether a transaction is currently open on this connection.
  fn is_active(&self) -> bool;

  fn begin(&mut self) -> Result<(), Self::Error>;

  fn commit(&mut self) -> Result<(), Self::Error>;

  fn rollback(&mut self) -> Result<(), Self::Error>;
}

/// Run `f` atomically against `ctx`.
///
/// If a transaction is already active, `f` joins it and commit or rollback
/// stays with whoever opened it. Otherwise a transaction is opened here,
/// committed when `f` succeeds and rolled back when it fails. A commit that
/// fails is rolled back as well, and its error returned.
pub fn run_in_transaction<C, T, E, F>(ctx: &mut C, f: F) -> Result<T, E>
where
  C: TransactionContext + ?Sized,
  E: From<C::Error> + std::fmt::Display,
  C::Error: std::fmt::Display,
  F: FnOnce(&mut C) -> Result<T, E>,
{
  if ctx.is_active() {
    tracing::trace!("joining ambient transaction");
    return f(ctx);
  }

  ctx.begin()?;
  match f(ctx) {
    Ok(value) => match ctx.commit() {
      Ok(()) => Ok(value),
      Err(commit_err) => {
        tracing::debug!(error = %commit_err, "commit failed, rolling back");
        if let Err(rollback_err) = ctx.rollback() {
          tracing::warn!(error = %rollback_err, "rollback failed");
        }
        Err(commit_err.into())
      }
    },
    Err(err) => {
      tracing::debug!(error = %err, "rolling back transaction");
      if let Err(rollback_err) = ctx.rollback() {
        tracing::warn!(error = %rollback_err, "rollback failed");
      }
      Err(err)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Records every call so tests can assert on the transaction protocol.
  #[derive(Default)]
  struct FakeContext {
    active:      bool,
    fail_commit: bool,
    log:         Vec<&'static str>,
  }

  impl TransactionContext for FakeContext {
    type Error = String;

    fn is_active(&self) -> bool { self.active }

    fn begin(&mut self) -> Result<(), String> {
      self.active = true;
      self.log.push("begin");
      Ok(())
    }

    fn commit(&mut self) -> Result<(), String> {
      if self.fail_commit {
        self.log.push("commit-failed");
        return Err("busy".to_owned());
      }
      self.active = false;
      self.log.push("commit");
      Ok(())
    }

    fn rollback(&mut self) -> Result<(), String> {
      self.active = false;
      self.log.push("rollback");
      Ok(())
    }
  }

  #[test]
  fn starts_and_commits_when_idle() {
    let mut ctx = FakeContext::default();
    let out: Result<i32, String> = run_in_transaction(&mut ctx, |c| {
      c.log.push("work");
      Ok(7)
    });
    assert_eq!(out, Ok(7));
    assert_eq!(ctx.log, ["begin", "work", "commit"]);
  }

  #[test]
  fn rolls_back_on_error() {
    let mut ctx = FakeContext::default();
    let out: Result<(), String> = run_in_transaction(&mut ctx, |c| {
      c.log.push("work");
      Err("boom".to_owned())
    });
    assert_eq!(out, Err("boom".to_owned()));
    assert_eq!(ctx.log, ["begin", "work", "rollback"]);
    assert!(!ctx.active);
  }

  #[test]
  fn joins_ambient_transaction() {
    let mut ctx = FakeContext { active: true, ..Default::default() };
    let out: Result<(), String> = run_in_transaction(&mut ctx, |c| {
      c.log.push("work");
      Err("boom".to_owned())
    });
    assert!(out.is_err());
    assert_eq!(ctx.log, ["work"]);
    assert!(ctx.active);
  }

  #[test]
  fn failed_commit_rolls_back() {
    let mut ctx = FakeContext { fail_commit: true, ..Default::default() };
    let out: Result<(), String> = run_in_transaction(&mut ctx, |c| {
      c.log.push("work");
      Ok(())
    });
    assert_eq!(out, Err("busy".to_owned()));
    assert_eq!(ctx.log, ["begin", "work", "commit-failed", "rollback"]);
    assert!(!ctx.active);

    // The next call opens its own transaction rather than joining a stale one.
    ctx.fail_commit = false;
    ctx.log.clear();
    let out: Result<(), String> = run_in_transaction(&mut ctx, |c| {
      c.log.push("work");
      Ok(())
    });
    assert_eq!(out, Ok(()));
    assert_eq!(ctx.log, ["begin", "work", "commit"]);
  }
}
