//! Single-iteration control loop
//!
//! One call to [`ControlLoop::poll`] is one loop iteration:
//!
//! 1. drain pending serial bytes into the line buffer (non-blocking)
//! 2. handle every completed line (`get`, `set`, or `Unknown command`)
//! 3. run the failsafe check, unconditionally
//! 4. let the actuator flush throttled writes
//!
//! Commands are handled before the check, so a command that arrives in
//! the same iteration the deadline would elapse keeps the link armed.
//! Telemetry carries the value on the hardware output, which lags the
//! commanded value while a throttled write is pending.

use dynamo_hal::{UartRx, UartTx};
use dynamo_protocol::{parse, Command, LineBuffer, ParseError, MAX_LINE_LEN, UNKNOWN_COMMAND};

use crate::config::WatchdogConfig;
use crate::safety::{FailsafeSupervisor, SupervisorStatus};
use crate::state::LinkState;
use crate::traits::{Actuator, SensorAdapter};

use super::telemetry::TelemetryReporter;

/// Receive chunk size
const RX_CHUNK: usize = 32;

/// Upper bound on receive chunks drained per iteration
///
/// Keeps a flooding host from starving the failsafe check.
const MAX_RX_CHUNKS: usize = 8;

/// Link counters since startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStats {
    /// `get`/`set` commands accepted
    pub accepted: u32,
    /// Non-empty lines that were not commands (including overflows)
    pub rejected: u32,
    /// Transitions into failsafe
    pub failsafe_entries: u32,
    /// Serial read or write failures
    pub io_errors: u32,
}

/// What happened during one iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IterationReport {
    /// Commands accepted this iteration
    pub accepted: u16,
    /// Lines rejected this iteration
    pub rejected: u16,
    /// Value applied by the last `set` this iteration
    pub applied: Option<i32>,
    /// Supervisor check outcome
    pub status: SupervisorStatus,
    /// Link state after the check
    pub link: LinkState,
    /// Serial failures this iteration
    pub io_errors: u16,
}

impl IterationReport {
    fn new(link: LinkState) -> Self {
        Self {
            accepted: 0,
            rejected: 0,
            applied: None,
            status: SupervisorStatus::Ok,
            link,
            io_errors: 0,
        }
    }

    /// Check if the iteration did nothing worth logging
    pub fn is_quiet(&self) -> bool {
        self.accepted == 0
            && self.rejected == 0
            && self.io_errors == 0
            && self.status == SupervisorStatus::Ok
    }
}

/// Actuator command loop with host watchdog and telemetry
pub struct ControlLoop<A, S, const N: usize = MAX_LINE_LEN> {
    actuator: A,
    sensors: S,
    supervisor: FailsafeSupervisor,
    reporter: TelemetryReporter,
    lines: LineBuffer<N>,
    stats: LinkStats,
}

impl<A, S, const N: usize> ControlLoop<A, S, N>
where
    A: Actuator,
    S: SensorAdapter,
{
    /// Create a loop armed at `now_ms`
    ///
    /// The actuator is expected to have written its startup value already.
    pub fn new(actuator: A, sensors: S, watchdog: WatchdogConfig, now_ms: u32) -> Self {
        Self {
            actuator,
            sensors,
            supervisor: FailsafeSupervisor::new(watchdog, now_ms),
            reporter: TelemetryReporter::new(),
            lines: LineBuffer::new(),
            stats: LinkStats::default(),
        }
    }

    /// Run one loop iteration
    pub fn poll<R, T>(&mut self, rx: &mut R, tx: &mut T, now_ms: u32) -> IterationReport
    where
        R: UartRx,
        T: UartTx,
    {
        let mut report = IterationReport::new(self.supervisor.state());
        let mut chunk = [0u8; RX_CHUNK];

        for _ in 0..MAX_RX_CHUNKS {
            let count = match rx.read_available(&mut chunk) {
                Ok(0) => break,
                Ok(count) => count,
                Err(_) => {
                    self.io_error(&mut report);
                    break;
                }
            };

            for &byte in &chunk[..count] {
                match self.lines.feed(byte) {
                    Ok(Some(line)) => self.handle_line(&line, tx, now_ms, &mut report),
                    Ok(None) => {}
                    Err(_) => self.reject(tx, &mut report),
                }
            }
        }

        report.status = self.supervisor.check(now_ms, &mut self.actuator);
        if report.status == SupervisorStatus::Tripped {
            self.stats.failsafe_entries = self.stats.failsafe_entries.wrapping_add(1);
        }
        report.link = self.supervisor.state();

        self.actuator.service(now_ms);
        report
    }

    fn handle_line<T: UartTx>(
        &mut self,
        line: &str,
        tx: &mut T,
        now_ms: u32,
        report: &mut IterationReport,
    ) {
        match parse(line) {
            Ok(Command::Query) => {
                self.accept(now_ms, report);
                self.send_report(tx, report);
            }
            Ok(Command::SetActuator(value)) => {
                let applied = self.actuator.apply(value);
                // Flush now if the write cadence allows it
                self.actuator.service(now_ms);
                report.applied = Some(applied);
                self.accept(now_ms, report);
                self.send_report(tx, report);
            }
            Err(ParseError::Empty) => {}
            Err(ParseError::Unrecognized) => self.reject(tx, report),
        }
    }

    fn accept(&mut self, now_ms: u32, report: &mut IterationReport) {
        self.supervisor.command_accepted(now_ms);
        self.stats.accepted = self.stats.accepted.wrapping_add(1);
        report.accepted = report.accepted.saturating_add(1);
    }

    fn reject<T: UartTx>(&mut self, tx: &mut T, report: &mut IterationReport) {
        self.stats.rejected = self.stats.rejected.wrapping_add(1);
        report.rejected = report.rejected.saturating_add(1);
        if tx.write_line(UNKNOWN_COMMAND).is_err() {
            self.io_error(report);
        }
    }

    fn send_report<T: UartTx>(&mut self, tx: &mut T, report: &mut IterationReport) {
        let line = self
            .reporter
            .report(&mut self.sensors, self.actuator.written());
        if tx.write_line(&line).is_err() {
            self.io_error(report);
        }
    }

    fn io_error(&mut self, report: &mut IterationReport) {
        self.stats.io_errors = self.stats.io_errors.wrapping_add(1);
        report.io_errors = report.io_errors.saturating_add(1);
    }

    /// Link counters since startup
    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// Current link state
    pub fn link_state(&self) -> LinkState {
        self.supervisor.state()
    }

    /// The actuator driver
    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// The sensor adapter
    pub fn sensors_mut(&mut self) -> &mut S {
        &mut self.sensors
    }

    /// Force the actuator safe and hand back the hardware
    pub fn shutdown(mut self) -> (A, S) {
        self.actuator.force_safe();
        (self.actuator, self.sensors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ActuatorRange;
    use crate::traits::SensorError;
    use heapless::{String, Vec};

    struct MockActuator {
        value: i32,
        serviced: u32,
    }

    impl Actuator for MockActuator {
        fn apply(&mut self, value: i32) -> i32 {
            self.value = ActuatorRange::DUTY_8BIT.clamp(value);
            self.value
        }

        fn force_safe(&mut self) -> i32 {
            self.apply(0)
        }

        fn state(&self) -> i32 {
            self.value
        }

        fn range(&self) -> ActuatorRange {
            ActuatorRange::DUTY_8BIT
        }

        fn service(&mut self, _now_ms: u32) {
            self.serviced += 1;
        }
    }

    struct NoSensors;

    impl SensorAdapter for NoSensors {
        fn read_current(&mut self) -> Result<f32, SensorError> {
            Err(SensorError::Bus)
        }

        fn read_bus_voltage(&mut self) -> Result<f32, SensorError> {
            Err(SensorError::Bus)
        }

        fn read_force(&mut self) -> Result<f32, SensorError> {
            Err(SensorError::NotReady)
        }
    }

    struct Rx {
        data: Vec<u8, 256>,
        pos: usize,
    }

    impl Rx {
        fn new(text: &str) -> Self {
            let mut data = Vec::new();
            data.extend_from_slice(text.as_bytes()).unwrap();
            Self { data, pos: 0 }
        }
    }

    impl UartRx for Rx {
        type Error = ();

        fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
            let rest = &self.data[self.pos..];
            let n = rest.len().min(buf.len());
            buf[..n].copy_from_slice(&rest[..n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[derive(Default)]
    struct Tx {
        out: String<1024>,
    }

    impl UartTx for Tx {
        type Error = ();

        fn write_all(&mut self, data: &[u8]) -> Result<(), ()> {
            let text = core::str::from_utf8(data).map_err(|_| ())?;
            self.out.push_str(text)
        }

        fn flush(&mut self) -> Result<(), ()> {
            Ok(())
        }
    }

    fn control() -> ControlLoop<MockActuator, NoSensors> {
        let actuator = MockActuator {
            value: 0,
            serviced: 0,
        };
        ControlLoop::new(actuator, NoSensors, WatchdogConfig { timeout_ms: 1000 }, 0)
    }

    #[test]
    fn test_set_reports_clamped_value() {
        let mut control = control();
        let mut tx = Tx::default();
        let report = control.poll(&mut Rx::new("set 9999\n"), &mut tx, 10);

        assert_eq!(report.accepted, 1);
        assert_eq!(report.applied, Some(255));
        assert_eq!(control.actuator().state(), 255);
        assert_eq!(
            tx.out.as_str(),
            "{\"current\": null, \"voltage\": null, \"tens\": null, \"pwm\": 255}\n"
        );
    }

    #[test]
    fn test_unknown_command() {
        let mut control = control();
        let mut tx = Tx::default();
        let report = control.poll(&mut Rx::new("spin\n\n"), &mut tx, 10);

        assert_eq!(report.rejected, 1);
        assert_eq!(report.accepted, 0);
        assert_eq!(tx.out.as_str(), "Unknown command\n");
        assert_eq!(control.stats().rejected, 1);
    }

    #[test]
    fn test_partial_line_waits() {
        let mut control = control();
        let mut tx = Tx::default();
        let report = control.poll(&mut Rx::new("set 12"), &mut tx, 10);

        assert!(report.is_quiet());
        assert!(tx.out.is_empty());
        assert_eq!(control.actuator().state(), 0);
    }

    #[test]
    fn test_unknown_command_does_not_feed_watchdog() {
        let mut control = control();
        let mut tx = Tx::default();
        control.poll(&mut Rx::new("set 100\n"), &mut tx, 0);
        control.poll(&mut Rx::new("hello\n"), &mut tx, 900);

        let report = control.poll(&mut Rx::new(""), &mut tx, 1001);
        assert_eq!(report.status, SupervisorStatus::Tripped);
        assert_eq!(report.link, LinkState::Failsafe);
        assert_eq!(control.actuator().state(), 0);
        assert_eq!(control.stats().failsafe_entries, 1);
    }

    #[test]
    fn test_command_in_same_iteration_as_deadline() {
        let mut control = control();
        let mut tx = Tx::default();
        let report = control.poll(&mut Rx::new("get\n"), &mut tx, 5000);

        assert_eq!(report.status, SupervisorStatus::Ok);
        assert_eq!(report.link, LinkState::Armed);
    }

    #[test]
    fn test_service_runs_every_iteration() {
        let mut control = control();
        let mut tx = Tx::default();
        for now in 0..5 {
            control.poll(&mut Rx::new(""), &mut tx, now);
        }
        assert_eq!(control.actuator().serviced, 5);
    }

    /// Holds commands back from the output until t=100
    struct LaggingActuator {
        value: i32,
        output: i32,
    }

    impl Actuator for LaggingActuator {
        fn apply(&mut self, value: i32) -> i32 {
            self.value = ActuatorRange::DUTY_8BIT.clamp(value);
            self.value
        }

        fn force_safe(&mut self) -> i32 {
            self.value = 0;
            self.output = 0;
            0
        }

        fn state(&self) -> i32 {
            self.value
        }

        fn written(&self) -> i32 {
            self.output
        }

        fn range(&self) -> ActuatorRange {
            ActuatorRange::DUTY_8BIT
        }

        fn service(&mut self, now_ms: u32) {
            if now_ms >= 100 {
                self.output = self.value;
            }
        }
    }

    #[test]
    fn test_reply_reports_output_not_pending_command() {
        let actuator = LaggingActuator {
            value: 0,
            output: 0,
        };
        let mut control: ControlLoop<LaggingActuator, NoSensors> =
            ControlLoop::new(actuator, NoSensors, WatchdogConfig { timeout_ms: 1000 }, 0);

        let mut tx = Tx::default();
        let report = control.poll(&mut Rx::new("set 50\n"), &mut tx, 10);
        assert_eq!(report.applied, Some(50));
        assert_eq!(
            tx.out.as_str(),
            "{\"current\": null, \"voltage\": null, \"tens\": null, \"pwm\": 0}\n"
        );

        // A write that is due lands before the reply
        let mut tx = Tx::default();
        control.poll(&mut Rx::new("set 60\n"), &mut tx, 100);
        assert_eq!(
            tx.out.as_str(),
            "{\"current\": null, \"voltage\": null, \"tens\": null, \"pwm\": 60}\n"
        );
    }

    #[test]
    fn test_shutdown_forces_safe() {
        let mut control = control();
        let mut tx = Tx::default();
        control.poll(&mut Rx::new("set 77\n"), &mut tx, 1);
        let (actuator, _) = control.shutdown();
        assert_eq!(actuator.state(), 0);
    }
}
