//! End-to-end rig behavior: host lines in, actuator writes and telemetry out

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use dynamo_core::config::{ActuatorRange, HardwareProfile, WritePolicy};
use dynamo_core::control::ControlLoop;
use dynamo_core::safety::SupervisorStatus;
use dynamo_core::state::LinkState;
use dynamo_core::traits::{Actuator, ActuatorOutput, SensorAdapter, SensorError};
use dynamo_drivers::actuator::ActuatorDriver;
use dynamo_hal::{UartRx, UartTx};
use proptest::prelude::*;

/// Hardware output that records every write
#[derive(Clone, Default)]
struct Pwm(Rc<RefCell<Vec<i32>>>);

impl Pwm {
    fn last(&self) -> Option<i32> {
        self.0.borrow().last().copied()
    }

    fn count(&self) -> usize {
        self.0.borrow().len()
    }
}

impl ActuatorOutput for Pwm {
    fn write(&mut self, value: i32) {
        self.0.borrow_mut().push(value);
    }
}

struct Sensors {
    current: Result<f32, SensorError>,
}

impl SensorAdapter for Sensors {
    fn read_current(&mut self) -> Result<f32, SensorError> {
        self.current
    }

    fn read_bus_voltage(&mut self) -> Result<f32, SensorError> {
        Ok(12.05)
    }

    fn read_force(&mut self) -> Result<f32, SensorError> {
        Ok(0.41)
    }
}

/// Bytes the host has sent and the device has not read yet
#[derive(Default)]
struct HostRx(VecDeque<u8>);

impl UartRx for HostRx {
    type Error = ();

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
        let n = buf.len().min(self.0.len());
        for (slot, byte) in buf.iter_mut().zip(self.0.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

/// Bytes the device has written to the host
#[derive(Default)]
struct HostTx(Vec<u8>);

impl UartTx for HostTx {
    type Error = ();

    fn write_all(&mut self, data: &[u8]) -> Result<(), ()> {
        self.0.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }
}

struct Rig {
    control: ControlLoop<ActuatorDriver<Pwm>, Sensors>,
    pwm: Pwm,
    rx: HostRx,
    tx: HostTx,
}

impl Rig {
    fn new(profile: HardwareProfile) -> Self {
        let pwm = Pwm::default();
        let actuator = ActuatorDriver::new(pwm.clone(), profile);
        let sensors = Sensors { current: Ok(1.23) };
        Self {
            control: ControlLoop::new(actuator, sensors, profile.watchdog, 0),
            pwm,
            rx: HostRx::default(),
            tx: HostTx::default(),
        }
    }

    /// Send `text`, run one iteration at `now_ms`, and collect the replies
    fn exchange(&mut self, text: &str, now_ms: u32) -> Vec<String> {
        self.rx.0.extend(text.bytes());
        self.control.poll(&mut self.rx, &mut self.tx, now_ms);
        let reply = String::from_utf8(std::mem::take(&mut self.tx.0)).unwrap();
        reply.lines().map(str::to_owned).collect()
    }

    /// Run one iteration with no host input
    fn idle(&mut self, now_ms: u32) -> SupervisorStatus {
        self.control.poll(&mut self.rx, &mut self.tx, now_ms).status
    }
}

fn telemetry(pwm: i32) -> String {
    format!(
        "{{\"current\": 1.23, \"voltage\": 12.05, \"tens\": 0.41, \"pwm\": {}}}",
        pwm
    )
}

#[test]
fn duty_rig_clamps_commands() {
    let mut rig = Rig::new(HardwareProfile::DUTY_PWM);

    assert_eq!(rig.exchange("set 150\n", 10), vec![telemetry(150)]);
    assert_eq!(rig.pwm.last(), Some(150));

    assert_eq!(rig.exchange("set 9999\n", 20), vec![telemetry(255)]);
    assert_eq!(rig.pwm.last(), Some(255));

    assert_eq!(rig.exchange("set -50\n", 30), vec![telemetry(0)]);
    assert_eq!(rig.pwm.last(), Some(0));
}

#[test]
fn esc_rig_clamps_commands() {
    let mut rig = Rig::new(HardwareProfile::ESC_PULSE);

    assert_eq!(rig.exchange("set 500\n", 10), vec![telemetry(1000)]);
    assert_eq!(rig.exchange("set 3000\n", 20), vec![telemetry(2000)]);
    assert_eq!(rig.pwm.last(), Some(2000));
}

#[test]
fn boot_then_get_reports_startup_value() {
    let mut rig = Rig::new(HardwareProfile::ESC_PULSE);
    assert_eq!(rig.pwm.last(), Some(1000));
    assert_eq!(rig.exchange("get\n", 5), vec![telemetry(1000)]);
}

#[test]
fn silence_after_set_returns_to_safe() {
    let mut rig = Rig::new(HardwareProfile::DUTY_PWM);
    rig.exchange("set 200\n", 0);

    for now in (100..=1000).step_by(100) {
        assert_eq!(rig.idle(now), SupervisorStatus::Ok);
    }
    assert_eq!(rig.pwm.last(), Some(200));

    assert_eq!(rig.idle(1001), SupervisorStatus::Tripped);
    assert_eq!(rig.pwm.last(), Some(0));

    assert_eq!(rig.exchange("get\n", 1500), vec![telemetry(0)]);
    assert_eq!(rig.control.link_state(), LinkState::Armed);
}

#[test]
fn get_postpones_failsafe() {
    let mut rig = Rig::new(HardwareProfile::DUTY_PWM);
    rig.exchange("set 120\n", 0);
    rig.exchange("get\n", 900);

    assert_eq!(rig.idle(1900), SupervisorStatus::Ok);
    assert_eq!(rig.pwm.last(), Some(120));
    assert_eq!(rig.idle(1901), SupervisorStatus::Tripped);
    assert_eq!(rig.pwm.last(), Some(0));
}

#[test]
fn unknown_lines_do_not_postpone_failsafe() {
    let mut rig = Rig::new(HardwareProfile::DUTY_PWM);
    rig.exchange("set 120\n", 0);

    assert_eq!(rig.exchange("spin up\n", 900), vec!["Unknown command"]);
    assert_eq!(rig.exchange("\r\n", 950), Vec::<String>::new());

    rig.idle(1001);
    assert_eq!(rig.pwm.last(), Some(0));
    assert_eq!(rig.control.stats().rejected, 1);
    assert_eq!(rig.control.stats().failsafe_entries, 1);
}

#[test]
fn split_command_waits_for_terminator() {
    let mut rig = Rig::new(HardwareProfile::DUTY_PWM);
    assert!(rig.exchange("se", 1).is_empty());
    assert!(rig.exchange("t 4", 2).is_empty());
    assert_eq!(rig.pwm.last(), Some(0));
    assert_eq!(rig.exchange("2\r\n", 3), vec![telemetry(42)]);
}

#[test]
fn overlong_line_is_rejected_once() {
    let mut rig = Rig::new(HardwareProfile::DUTY_PWM);
    let long = format!("set {}\n", "1".repeat(200));
    assert_eq!(rig.exchange(&long, 1), vec!["Unknown command"]);
    assert_eq!(rig.exchange("get\n", 2), vec![telemetry(0)]);
}

#[test]
fn failed_sensor_reports_null() {
    let mut rig = Rig::new(HardwareProfile::DUTY_PWM);
    rig.control.sensors_mut().current = Err(SensorError::Bus);
    assert_eq!(
        rig.exchange("get\n", 1),
        vec!["{\"current\": null, \"voltage\": 12.05, \"tens\": 0.41, \"pwm\": 0}"]
    );
}

#[test]
fn throttled_rig_flushes_on_interval() {
    let profile = HardwareProfile {
        write_policy: WritePolicy::Throttled {
            min_interval_ms: 100,
        },
        ..HardwareProfile::DUTY_PWM
    };
    let mut rig = Rig::new(profile);

    // First write is never throttled
    assert_eq!(rig.exchange("set 80\n", 0), vec![telemetry(80)]);
    assert_eq!(rig.pwm.last(), Some(80));

    // Inside the interval the reply reports what the output holds
    assert_eq!(rig.exchange("set 90\n", 50), vec![telemetry(80)]);
    assert_eq!(rig.pwm.last(), Some(80));

    rig.idle(100);
    assert_eq!(rig.pwm.last(), Some(90));
    assert_eq!(rig.exchange("get\n", 110), vec![telemetry(90)]);
}

#[test]
fn throttled_set_after_interval_writes_before_reply() {
    let profile = HardwareProfile {
        write_policy: WritePolicy::Throttled {
            min_interval_ms: 100,
        },
        ..HardwareProfile::DUTY_PWM
    };
    let mut rig = Rig::new(profile);
    rig.exchange("set 80\n", 0);

    assert_eq!(rig.exchange("set 120\n", 150), vec![telemetry(120)]);
    assert_eq!(rig.pwm.last(), Some(120));
}

#[test]
fn failsafe_write_is_not_throttled() {
    let profile = HardwareProfile {
        write_policy: WritePolicy::Throttled {
            min_interval_ms: 10_000,
        },
        ..HardwareProfile::DUTY_PWM
    };
    let mut rig = Rig::new(profile);
    rig.exchange("set 200\n", 0);
    assert_eq!(rig.pwm.last(), Some(200));

    rig.idle(1001);
    assert_eq!(rig.pwm.last(), Some(0));
}

#[test]
fn failsafe_is_reasserted_without_extra_writes() {
    let mut rig = Rig::new(HardwareProfile::DUTY_PWM);
    rig.exchange("set 200\n", 0);
    rig.idle(1001);
    let writes = rig.pwm.count();
    for now in 1002..1010 {
        rig.idle(now);
    }
    assert_eq!(rig.pwm.count(), writes);
    assert!(rig.control.actuator().is_safe());
}

proptest! {
    #[test]
    fn driver_clamps_every_integer(value in any::<i32>()) {
        for profile in [HardwareProfile::DUTY_PWM, HardwareProfile::ESC_PULSE] {
            let pwm = Pwm::default();
            let mut driver = ActuatorDriver::new(pwm.clone(), profile);
            let range: ActuatorRange = profile.range;
            let applied = driver.apply(value);

            prop_assert!(range.contains(applied));
            prop_assert_eq!(applied, value.clamp(range.min(), range.max()));
            prop_assert_eq!(pwm.last(), Some(applied));
        }
    }

    #[test]
    fn any_set_line_reports_clamped_value(value in any::<i64>()) {
        let mut rig = Rig::new(HardwareProfile::DUTY_PWM);
        let expected = value.clamp(0, 255) as i32;
        let lines = rig.exchange(&format!("set {}\n", value), 1);
        prop_assert_eq!(lines, vec![telemetry(expected)]);
    }
}
