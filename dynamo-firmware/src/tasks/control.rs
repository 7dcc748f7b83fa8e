//! Control loop task
//!
//! Polls the host link, services the actuator and checks the failsafe
//! deadline once per tick.

use defmt::*;
use dynamo_core::control::{ControlLoop, IterationReport};
use dynamo_core::safety::SupervisorStatus;
use dynamo_drivers::actuator::ActuatorDriver;
use dynamo_drivers::sensor::DynoSensors;
use dynamo_hal::Clock;
use embassy_rp::gpio::{Input, Output};
use embassy_rp::i2c::{Blocking, I2c};
use embassy_rp::peripherals::I2C0;
use embassy_time::{Delay, Duration, Instant, Ticker};

use crate::output::PwmOutput;
use crate::serial::{SerialRx, SerialTx};

/// Loop period in milliseconds
pub const TICK_INTERVAL_MS: u64 = 1;

pub type RigActuator = ActuatorDriver<PwmOutput>;
pub type RigSensors = DynoSensors<I2c<'static, I2C0, Blocking>, Input<'static>, Output<'static>, Delay>;
pub type Rig = ControlLoop<RigActuator, RigSensors>;

/// Milliseconds since boot from the embassy time driver
#[derive(Clone, Copy)]
pub struct BootClock;

impl Clock for BootClock {
    fn now_ms(&self) -> u32 {
        // Truncation wraps every ~49.7 days; consumers use elapsed_ms
        Instant::now().as_millis() as u32
    }
}

/// Control task - runs the rig until power-off
#[embassy_executor::task]
pub async fn control_task(mut rig: Rig, mut rx: SerialRx, mut tx: SerialTx, clock: BootClock) {
    info!("Control task started");

    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS));

    loop {
        let report = rig.poll(&mut rx, &mut tx, clock.now_ms());
        if !report.is_quiet() {
            log_report(&report);
        }
        ticker.next().await;
    }
}

fn log_report(report: &IterationReport) {
    match report.status {
        SupervisorStatus::Tripped => {
            warn!("Host silent, actuator forced safe");
        }
        SupervisorStatus::Ok => {
            if let Some(value) = report.applied {
                debug!("Actuator set to {}", value);
            }
            trace!(
                "Iteration: accepted={}, rejected={}, link={:?}",
                report.accepted,
                report.rejected,
                report.link
            );
        }
    }
    if report.rejected > 0 {
        debug!("Rejected {} host line(s)", report.rejected);
    }
    if report.io_errors > 0 {
        warn!("Host link errors: {}", report.io_errors);
    }
}
