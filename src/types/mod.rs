//! Core types for race state representation.
//!
//! ## Architecture
//!
//! - [`RaceState`] is the last-known snapshot of the player's car, merged from
//!   partial packet updates
//! - [`StateUpdate`] / [`OwnedFields`] describe what one packet contributes
//! - [`DamageVector`] holds the four damage channels used for collision detection
//! - [`SessionType`] decodes the game's session type code
//! - [`UpdateRate`] controls how often snapshot subscribers are woken
//!
//! ## Usage Example
//!
//! ```rust
//! use pitlane_sr::types::{OwnedFields, RaceState, StateUpdate};
//! use std::time::SystemTime;
//!
//! let update = StateUpdate {
//!     session_uid: 0xDEAD_BEEF,
//!     session_time: 12.5,
//!     received_at: SystemTime::now(),
//!     fields: OwnedFields::LapData { current_lap: 2, is_off_track: false },
//! };
//!
//! let state = RaceState::from_update(&update);
//! assert_eq!(state.current_lap, 2);
//! assert_eq!(state.session_type, 0);
//! ```

mod damage;
mod race_state;
mod session_type;
mod update_rate;

pub use damage::DamageVector;
pub use race_state::{OwnedFields, RaceState, StateUpdate};
pub use session_type::{RACE_SESSION_CODE, SessionType};
pub use update_rate::UpdateRate;

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use std::time::{Duration, SystemTime};

    prop_compose! {
        fn arb_fields()(
            kind in 0u8..3,
            session_type in any::<u8>(),
            track_id in any::<i8>(),
            paused in any::<bool>(),
            lap in any::<u8>(),
            off_track in any::<bool>(),
            wings in any::<(u8, u8, u8)>(),
        ) -> OwnedFields {
            match kind {
                0 => OwnedFields::Session { session_type, track_id, game_paused: paused },
                1 => OwnedFields::LapData { current_lap: lap, is_off_track: off_track },
                _ => OwnedFields::CarDamage(DamageVector::from_wings(wings.0, wings.1, wings.2)),
            }
        }
    }

    proptest! {
        #[test]
        fn prop_merge_only_touches_owned_fields(
            fields in prop::collection::vec(arb_fields(), 1..40),
            uid in any::<u64>(),
        ) {
            let start = SystemTime::UNIX_EPOCH;
            let mut state: Option<RaceState> = None;

            for (index, fields) in fields.into_iter().enumerate() {
                let update = StateUpdate {
                    session_uid: uid,
                    session_time: index as f32,
                    received_at: start + Duration::from_millis(index as u64 * 16),
                    fields,
                };

                let before = state.clone();
                let after = match state.as_mut() {
                    Some(existing) => {
                        existing.apply(&update);
                        existing.clone()
                    }
                    None => RaceState::from_update(&update),
                };

                if let Some(before) = before {
                    match fields {
                        OwnedFields::Session { .. } => {
                            prop_assert_eq!(after.current_lap, before.current_lap);
                            prop_assert_eq!(after.is_off_track, before.is_off_track);
                            prop_assert_eq!(after.damage, before.damage);
                        }
                        OwnedFields::LapData { .. } => {
                            prop_assert_eq!(after.session_type, before.session_type);
                            prop_assert_eq!(after.track_id, before.track_id);
                            prop_assert_eq!(after.damage, before.damage);
                        }
                        OwnedFields::CarDamage(_) => {
                            prop_assert_eq!(after.session_type, before.session_type);
                            prop_assert_eq!(after.game_paused, before.game_paused);
                            prop_assert_eq!(after.current_lap, before.current_lap);
                        }
                    }
                }

                prop_assert_eq!(after.session_time, index as f32);
                state = Some(after);
            }
        }
    }
}
