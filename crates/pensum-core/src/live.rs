//! Live values — continuously updating query results and the plumbing that
//! derives screen state from them.
//!
//! Three pieces:
//!
//! - [`Live<T>`]: a handle on a value that changes over time. The current
//!   value is always readable synchronously; [`Live::changed`] resolves when
//!   the producer publishes a newer one. Producers stop when every handle is
//!   dropped, so teardown propagates through derivation chains for free.
//! - [`combine2`] .. [`combine5`]: fan-in. Hold the latest value from each
//!   source and re-derive a merged value whenever any one of them updates.
//! - [`SharedLive<T>`]: runs a pipeline only while someone is watching, with
//!   a grace window so a brief gap between observers reuses the running
//!   pipeline instead of rebuilding it.
//!
//! Every derivation stage drops emissions that compare equal to the previous
//! value, so a write that does not change a query's result is invisible
//! downstream.

use std::{
  future::Future,
  pin::Pin,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
  time::Duration,
};

use tokio::{sync::watch, task::JoinHandle};

// ─── Live ────────────────────────────────────────────────────────────────────

/// A handle on a continuously updating value.
#[derive(Debug)]
pub struct Live<T> {
  rx: watch::Receiver<T>,
}

impl<T> Clone for Live<T> {
  fn clone(&self) -> Self {
    Self { rx: self.rx.clone() }
  }
}

/// Create a connected producer half and [`Live`] handle, seeded with
/// `initial`.
pub fn channel<T>(initial: T) -> (watch::Sender<T>, Live<T>) {
  let (tx, rx) = watch::channel(initial);
  (tx, Live { rx })
}

impl<T: Clone> Live<T> {
  /// Clone of the current value.
  pub fn get(&self) -> T {
    self.rx.borrow().clone()
  }

  /// Wait until the producer publishes a value this handle has not seen.
  /// Returns `false` once the producer is gone.
  pub async fn changed(&mut self) -> bool {
    self.rx.changed().await.is_ok()
  }

  /// Wait for the next unseen value. Returns `None` once the producer is
  /// gone.
  pub async fn next(&mut self) -> Option<T> {
    self.rx.changed().await.ok()?;
    Some(self.rx.borrow_and_update().clone())
  }
}

impl<T: Clone + Send + Sync + 'static> Live<T> {
  /// Derive a new live value by applying `f` to the current value and to
  /// every subsequent emission.
  pub fn map<U, F>(mut self, f: F) -> Live<U>
  where
    U: Clone + PartialEq + Send + Sync + 'static,
    F: Fn(&T) -> U + Send + 'static,
  {
    let initial = f(&self.rx.borrow_and_update());
    let (tx, live) = channel(initial);
    tokio::spawn(async move {
      loop {
        tokio::select! {
          changed = self.rx.changed() => {
            if changed.is_err() {
              break;
            }
            let next = f(&self.rx.borrow_and_update());
            send_deduped(&tx, next);
          }
          () = tx.closed() => break,
        }
      }
    });
    live
  }
}

fn send_deduped<T: PartialEq>(tx: &watch::Sender<T>, next: T) {
  tx.send_if_modified(|current| {
    if *current == next {
      false
    } else {
      *current = next;
      true
    }
  });
}

/// Pump every emission of `live` into `tx` until the source ends. Values
/// equal to what `tx` already holds are not re-sent.
pub async fn forward<T: Clone + PartialEq>(
  mut live: Live<T>,
  tx: watch::Sender<T>,
) {
  loop {
    send_deduped(&tx, live.get());
    if !live.changed().await {
      break;
    }
  }
}

// ─── Combine ─────────────────────────────────────────────────────────────────

macro_rules! combine_fn {
  ($name:ident => $($src:ident: $ty:ident),+) => {
    /// Merge the latest values of the sources with `f`. The merged value is
    /// computed once up front and then again whenever any source updates;
    /// results equal to the previous one are dropped.
    pub fn $name<$($ty,)+ Out, F>($(mut $src: Live<$ty>,)+ f: F) -> Live<Out>
    where
      $($ty: Clone + Send + Sync + 'static,)+
      Out: Clone + PartialEq + Send + Sync + 'static,
      F: Fn($(&$ty,)+) -> Out + Send + 'static,
    {
      let initial = f($(&$src.rx.borrow_and_update(),)+);
      let (tx, live) = channel(initial);
      tokio::spawn(async move {
        loop {
          tokio::select! {
            $(changed = $src.rx.changed() => {
              if changed.is_err() {
                break;
              }
            })+
            () = tx.closed() => break,
          }
          let next = f($(&$src.rx.borrow_and_update(),)+);
          send_deduped(&tx, next);
        }
      });
      live
    }
  };
}

combine_fn!(combine2 => a: A, b: B);
combine_fn!(combine3 => a: A, b: B, c: C);
combine_fn!(combine4 => a: A, b: B, c: C, d: D);
combine_fn!(combine5 => a: A, b: B, c: C, d: D, e: E);

// ─── SharedLive ──────────────────────────────────────────────────────────────

type PipelineFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// A value pipeline that runs only while observed.
///
/// [`SharedLive::watch`] hands out an [`Observer`] and starts the pipeline
/// if it is not already running. When the last observer is dropped the
/// pipeline keeps running for the grace window; an observer arriving within
/// it reuses the running pipeline. Once the window lapses the pipeline is
/// stopped, and the next observer restarts it from cold.
pub struct SharedLive<T: Send + Sync + 'static> {
  shared: Arc<Shared<T>>,
}

struct Shared<T> {
  tx:    watch::Sender<T>,
  start: Box<dyn Fn(watch::Sender<T>) -> PipelineFuture + Send + Sync>,
  grace: Duration,
  state: Mutex<RunState>,
}

struct RunState {
  observers: usize,
  /// Bumped on every observer arrival and departure; a pending teardown
  /// timer only fires if the epoch it captured is still current.
  epoch:     u64,
  pipeline:  Option<JoinHandle<()>>,
}

impl<T> Shared<T> {
  fn lock(&self) -> MutexGuard<'_, RunState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl<T> Drop for Shared<T> {
  fn drop(&mut self) {
    if let Some(pipeline) = self.lock().pipeline.take() {
      pipeline.abort();
    }
  }
}

impl<T: Clone + Send + Sync + 'static> SharedLive<T> {
  /// `start` builds the pipeline future each time the value goes from cold
  /// to observed; the future publishes through the given sender and runs
  /// until aborted.
  pub fn new<F, Fut>(initial: T, grace: Duration, start: F) -> Self
  where
    F: Fn(watch::Sender<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
  {
    let (tx, _) = watch::channel(initial);
    Self {
      shared: Arc::new(Shared {
        tx,
        start: Box::new(move |tx| Box::pin(start(tx))),
        grace,
        state: Mutex::new(RunState {
          observers: 0,
          epoch:     0,
          pipeline:  None,
        }),
      }),
    }
  }

  /// The last published value, without starting the pipeline.
  pub fn peek(&self) -> T {
    self.shared.tx.borrow().clone()
  }

  /// Attach an observer, starting the pipeline if necessary. The observer
  /// is subscribed before the pipeline runs, so it never misses the first
  /// emission of a cold start.
  pub fn watch(&self) -> Observer<T> {
    let mut state = self.shared.lock();
    state.observers += 1;
    state.epoch += 1;
    let rx = self.shared.tx.subscribe();
    if state.pipeline.is_none() {
      state.pipeline =
        Some(tokio::spawn((self.shared.start)(self.shared.tx.clone())));
    }
    drop(state);
    Observer {
      live:   Live { rx },
      _guard: ObserverGuard { shared: Arc::clone(&self.shared) },
    }
  }
}

/// A subscription to a [`SharedLive`]. The pipeline stays hot as long as at
/// least one observer exists.
pub struct Observer<T: Send + Sync + 'static> {
  live:   Live<T>,
  _guard: ObserverGuard<T>,
}

impl<T: Clone + Send + Sync + 'static> Observer<T> {
  pub fn get(&self) -> T {
    self.live.get()
  }

  /// Wait for a value this observer has not seen yet.
  pub async fn changed(&mut self) -> bool {
    self.live.changed().await
  }

  pub async fn next(&mut self) -> Option<T> {
    self.live.next().await
  }
}

struct ObserverGuard<T: Send + Sync + 'static> {
  shared: Arc<Shared<T>>,
}

impl<T: Send + Sync + 'static> Drop for ObserverGuard<T> {
  fn drop(&mut self) {
    let mut state = self.shared.lock();
    state.observers -= 1;
    state.epoch += 1;
    if state.observers > 0 {
      return;
    }
    let epoch = state.epoch;
    match tokio::runtime::Handle::try_current() {
      Ok(handle) => {
        drop(state);
        let shared = Arc::clone(&self.shared);
        handle.spawn(async move {
          tokio::time::sleep(shared.grace).await;
          let mut state = shared.lock();
          if state.epoch == epoch && state.observers == 0 {
            if let Some(pipeline) = state.pipeline.take() {
              pipeline.abort();
            }
          }
        });
      }
      // No runtime to time the grace window on; stop immediately.
      Err(_) => {
        if let Some(pipeline) = state.pipeline.take() {
          pipeline.abort();
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use super::*;

  #[tokio::test]
  async fn map_derives_initial_value_eagerly() {
    let (_tx, live) = channel(2i64);
    let even = live.map(|n| n % 2 == 0);
    assert!(even.get());
  }

  #[tokio::test]
  async fn map_suppresses_equal_results() {
    let (tx, live) = channel(1i64);
    let mut even = live.map(|n| n % 2 == 0);
    assert!(!even.get());
    // Still odd: the mapped value does not change, so nothing is emitted.
    tx.send(3).unwrap();
    tx.send(4).unwrap();
    assert_eq!(even.next().await, Some(true));
  }

  #[tokio::test]
  async fn combine_reemits_on_any_source() {
    let (ta, a) = channel(1i64);
    let (tb, b) = channel(10i64);
    let mut sum = combine2(a, b, |a, b| a + b);
    assert_eq!(sum.get(), 11);
    ta.send(2).unwrap();
    assert_eq!(sum.next().await, Some(12));
    tb.send(20).unwrap();
    assert_eq!(sum.next().await, Some(22));
  }

  #[tokio::test]
  async fn dropping_derived_handle_releases_source() {
    let (tx, live) = channel(0i64);
    let mapped = live.map(|n| *n);
    drop(mapped);
    // Resolves only once the map task has exited and dropped its receiver.
    tx.closed().await;
  }

  #[tokio::test(start_paused = true)]
  async fn shared_pipeline_starts_once_per_observation_window() {
    let starts = Arc::new(AtomicUsize::new(0));
    let shared = SharedLive::new(0usize, Duration::from_secs(5), {
      let starts = Arc::clone(&starts);
      move |tx| {
        let n = starts.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
          tx.send_modify(|v| *v = n);
          std::future::pending::<()>().await;
        }
      }
    });

    let first = shared.watch();
    let second = shared.watch();
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(starts.load(Ordering::SeqCst), 1);
    assert_eq!(first.get(), 1);
    drop(first);
    drop(second);

    // Within the grace window: the pipeline is reused, not restarted.
    tokio::time::sleep(Duration::from_secs(2)).await;
    let again = shared.watch();
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(starts.load(Ordering::SeqCst), 1);
    drop(again);

    // Past the grace window: the pipeline is torn down and the next
    // observer starts it from cold.
    tokio::time::sleep(Duration::from_secs(6)).await;
    let cold = shared.watch();
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(starts.load(Ordering::SeqCst), 2);
    assert_eq!(cold.get(), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn unobserved_shared_pipeline_never_starts() {
    let starts = Arc::new(AtomicUsize::new(0));
    let shared = SharedLive::new((), Duration::from_secs(5), {
      let starts = Arc::clone(&starts);
      move |_tx| {
        starts.fetch_add(1, Ordering::SeqCst);
        async {}
      }
    });
    tokio::time::sleep(Duration::from_secs(10)).await;
    shared.peek();
    assert_eq!(starts.load(Ordering::SeqCst), 0);
  }
}
