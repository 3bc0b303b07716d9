//! Game controller input
//!
//! The joystick driver emits fixed 8-byte records (see [`event`]). Each poll
//! drains the device and folds every record into a [`ControllerSnapshot`];
//! bindings then read the snapshot through [`ControllerDevice::producer`]:
//!
//! | key                          | value                                  |
//! |------------------------------|----------------------------------------|
//! | `x` `circle` `triangle` ...  | 1 while pressed, else 0                |
//! | `lt` `rt`                    | trigger pull in [0, 1]                 |
//! | `lrt`                        | right minus left trigger in [-1, 1]    |
//! | `ljoy.<c>` `rjoy.<c>`        | stick component in [-1, 1]             |
//! | `dpad.<c>`                   | pad component in {-1, 0, 1}            |
//!
//! where `<c>` is one of `x y left up right down`. Directional components
//! only read their own half of the axis.

mod controller;
mod error;
pub mod event;
mod snapshot;

pub use controller::{normalize_signed, normalize_unsigned, ControllerDevice};
pub use error::ProtocolError;
pub use event::{ControllerEvent, EventType};
pub use snapshot::{Axis, Button, ControllerSnapshot, Direction};

#[cfg(test)]
mod tests {
    use super::event::encode;
    use super::*;
    use proptest::prelude::*;

    fn arb_event() -> impl Strategy<Value = ControllerEvent> {
        prop_oneof![
            (0u8..13, 0u16..2).prop_map(|(id, data)| ControllerEvent::button(id, data)),
            (0u8..8, any::<i16>()).prop_map(|(id, value)| ControllerEvent::axis(id, value)),
        ]
    }

    proptest! {
        #[test]
        fn decoding_is_deterministic(events in prop::collection::vec(arb_event(), 0..64)) {
            let buffer = encode(&events);
            let mut first = ControllerSnapshot::default();
            let mut second = ControllerSnapshot::default();
            first.decode(&buffer).unwrap();
            second.decode(&buffer).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn dpad_axes_commute(x in any::<i16>(), y in any::<i16>()) {
            let horizontal = ControllerEvent::axis(6, x);
            let vertical = ControllerEvent::axis(7, y);

            let mut xy = ControllerSnapshot::default();
            xy.decode(&encode(&[horizontal, vertical])).unwrap();
            let mut yx = ControllerSnapshot::default();
            yx.decode(&encode(&[vertical, horizontal])).unwrap();

            prop_assert_eq!(xy.dpad, yx.dpad);
            prop_assert_eq!(xy.dpad.contains(Direction::LEFT), x < 0);
            prop_assert_eq!(xy.dpad.contains(Direction::RIGHT), x > 0);
            prop_assert_eq!(xy.dpad.contains(Direction::UP), y < 0);
            prop_assert_eq!(xy.dpad.contains(Direction::DOWN), y > 0);
        }

        #[test]
        fn misaligned_buffers_are_rejected(len in 1usize..64) {
            prop_assume!(len % event::EVENT_SIZE != 0);
            let mut snapshot = ControllerSnapshot::default();
            prop_assert_eq!(
                snapshot.decode(&vec![0u8; len]),
                Err(ProtocolError::Misaligned { len })
            );
        }
    }
}
