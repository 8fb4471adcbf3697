//! Declarative macros for ergonomic effect construction

/// Create an `Effect::Future` from an async block body
///
/// # Example
///
/// ```rust,ignore
/// use flightdeck_core::async_effect;
///
/// async_effect! {
///     let config = inventory.flight_seats(&flight).await;
///     Some(BookingAction::SeatMapLoaded { flight, result: config })
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Create an `Effect::Cancellable` around an async block body
///
/// # Example
///
/// ```rust,ignore
/// use flightdeck_core::cancellable_effect;
///
/// cancellable_effect! {
///     id: EffectId::new(format!("seat-map:{flight}")),
///     body: {
///         let result = inventory.flight_seats(&flight).await;
///         Some(BookingAction::SeatMapLoaded { flight, result })
///     }
/// }
/// ```
#[macro_export]
macro_rules! cancellable_effect {
    (
        id: $id:expr,
        body: { $($body:tt)* }
    ) => {
        $crate::effect::Effect::Cancellable {
            id: $id,
            effect: ::std::boxed::Box::new($crate::async_effect! { $($body)* }),
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::effect::{Effect, EffectId};

    #[test]
    fn async_effect_builds_future() {
        let effect: Effect<u32> = async_effect! { Some(7) };
        assert!(matches!(effect, Effect::Future(_)));
    }

    #[test]
    fn cancellable_effect_keeps_id() {
        let effect: Effect<u32> = cancellable_effect! {
            id: EffectId::from_static("fetch"),
            body: { None }
        };

        match effect {
            Effect::Cancellable { id, effect } => {
                assert_eq!(id.as_str(), "fetch");
                assert!(matches!(*effect, Effect::Future(_)));
            },
            other => unreachable!("unexpected effect {other:?}"),
        }
    }

    #[test]
    fn async_effect_future_resolves() {
        let effect: Effect<&str> = async_effect! { Some("done") };
        if let Effect::Future(fut) = effect {
            assert_eq!(tokio_test::block_on(fut), Some("done"));
        }
    }
}
