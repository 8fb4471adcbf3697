//! Integration tests for state subscriptions
//!
//! Every subscriber must see every published version, in order, starting
//! with the state current when it subscribed.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

use flightdeck_core::{SmallVec, async_effect, effect::Effect, reducer::Reducer, smallvec};
use flightdeck_runtime::{LoadingTracker, Store};
use futures::StreamExt;
use std::time::Duration;

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
struct Wizard {
    step: u32,
    history: Vec<u32>,
}

#[derive(Debug, Clone)]
enum WizardAction {
    Next,
    Stay,
    NextLater(u64),
}

struct WizardReducer;

impl Reducer for WizardReducer {
    type State = Wizard;
    type Action = WizardAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            WizardAction::Next => {
                state.step += 1;
                state.history.push(state.step);
                smallvec![Effect::None]
            },
            WizardAction::Stay => smallvec![Effect::None],
            WizardAction::NextLater(millis) => smallvec![async_effect! {
                tokio::time::sleep(Duration::from_millis(millis)).await;
                Some(WizardAction::Next)
            }],
        }
    }
}

fn store() -> Store<Wizard, WizardAction, (), WizardReducer> {
    Store::new(Wizard::default(), WizardReducer, ())
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn subscription_starts_with_current_state() {
    let store = store();
    store.send(WizardAction::Next).await.unwrap();

    let mut subscription = store.subscribe().await;
    let first = subscription.try_recv().unwrap();
    assert_eq!(first.version, 1);
    assert_eq!(first.state.step, 1);
    assert!(subscription.try_recv().is_none());
}

#[tokio::test]
async fn no_version_is_skipped() {
    let store = store();
    let mut subscription = store.subscribe().await;

    for _ in 0..50 {
        store.send(WizardAction::Next).await.unwrap();
        store.send(WizardAction::Stay).await.unwrap();
    }

    let snapshots = subscription.drain();
    let versions: Vec<u64> = snapshots.iter().map(|s| s.version).collect();
    assert_eq!(versions, (0..=50).collect::<Vec<_>>());
    for snapshot in &snapshots {
        assert_eq!(u64::from(snapshot.state.step), snapshot.version);
    }
}

#[tokio::test]
async fn every_subscriber_sees_the_same_sequence() {
    let store = store();
    let mut first = store.subscribe().await;
    let mut second = store.subscribe().await;

    store.send(WizardAction::NextLater(5)).await.unwrap();
    store.send(WizardAction::Next).await.unwrap();
    store.settle(Duration::from_secs(1)).await.unwrap();

    let first: Vec<Vec<u32>> = first.drain().iter().map(|s| s.state.history.clone()).collect();
    let second: Vec<Vec<u32>> = second.drain().iter().map(|s| s.state.history.clone()).collect();
    assert_eq!(first, vec![vec![], vec![1], vec![1, 2]]);
    assert_eq!(first, second);
}

#[tokio::test]
async fn subscription_is_a_stream() {
    let store = store();
    let subscription = store.subscribe().await;

    let writer = store.clone();
    tokio::spawn(async move {
        for _ in 0..3 {
            writer.send(WizardAction::Next).await.unwrap();
        }
    });

    let steps: Vec<u32> = subscription
        .take(4)
        .map(|snapshot| snapshot.state.step)
        .collect()
        .await;
    assert_eq!(steps, vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn dropped_subscribers_are_released() {
    let store = store();
    let kept = store.subscribe().await;
    drop(store.subscribe().await);

    store.send(WizardAction::Next).await.unwrap();
    store.send(WizardAction::Next).await.unwrap();

    let mut kept = kept;
    assert_eq!(kept.drain().len(), 3);
}

#[tokio::test]
async fn stores_can_share_a_loading_tracker() {
    let loading = LoadingTracker::new();
    let first = Store::with_loading(Wizard::default(), WizardReducer, (), loading.clone());
    let second = Store::with_loading(Wizard::default(), WizardReducer, (), loading.clone());

    first.send(WizardAction::NextLater(20)).await.unwrap();
    second.send(WizardAction::NextLater(40)).await.unwrap();
    assert_eq!(loading.in_flight(), 2);

    first.settle(Duration::from_secs(1)).await.unwrap();
    assert!(loading.is_busy());

    second.settle(Duration::from_secs(1)).await.unwrap();
    assert!(!loading.is_busy());
}
