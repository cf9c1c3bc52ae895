//! G-code emitter.
//!
//! A small state machine (`Idle -> HeaderEmitted -> FooterEmitted -> Closed`)
//! that turns ordered segments into GRBL laser G-code. The emitter remembers
//! the last written X, Y, motion mode, power and speed and leaves out any
//! word that would print the same as before. Switching between rapid and
//! cutting motion, and enabling or disabling the laser, force the next move
//! to be written in full.

use crate::error::{CamToolError, CamToolResult};
use burnkit_core::constants::COORD_PRECISION;
use burnkit_core::{Job, MachineSettings, PathSegment, Point, SegmentOrigin};
use tracing::{debug, warn};

/// Lifecycle of a G-code program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitterPhase {
    Idle,
    HeaderEmitted,
    FooterEmitted,
    Closed,
}

impl EmitterPhase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::HeaderEmitted => "header emitted",
            Self::FooterEmitted => "footer emitted",
            Self::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Motion {
    Rapid,
    Cut,
}

impl Motion {
    fn word(self) -> &'static str {
        match self {
            Self::Rapid => "G0",
            Self::Cut => "G1",
        }
    }
}

/// Last values written to the output, as printed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmitterState {
    x: Option<String>,
    y: Option<String>,
    motion: Option<Motion>,
    power: Option<u32>,
    speed: Option<u32>,
    force_full: bool,
}

/// Accumulates a G-code program in memory.
#[derive(Debug)]
pub struct GCodeGenerator {
    settings: MachineSettings,
    precision: usize,
    phase: EmitterPhase,
    state: EmitterState,
    lines: Vec<String>,
    last_origin: Option<SegmentOrigin>,
    power_clamp_reported: bool,
    power_clamp_warnings: usize,
}

impl GCodeGenerator {
    pub fn new(settings: MachineSettings) -> Self {
        Self {
            settings,
            precision: COORD_PRECISION,
            phase: EmitterPhase::Idle,
            state: EmitterState::default(),
            lines: Vec::new(),
            last_origin: None,
            power_clamp_reported: false,
            power_clamp_warnings: 0,
        }
    }

    /// Decimal places for X/Y words.
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    pub fn phase(&self) -> EmitterPhase {
        self.phase
    }

    pub fn settings(&self) -> &MachineSettings {
        &self.settings
    }

    /// Number of power clamp warnings logged, at most one per job.
    pub fn power_clamp_warnings(&self) -> usize {
        self.power_clamp_warnings
    }

    /// Lines emitted so far.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Start a new document.
    pub fn reset(&mut self) {
        self.phase = EmitterPhase::Idle;
        self.state = EmitterState::default();
        self.lines.clear();
        self.last_origin = None;
        self.power_clamp_reported = false;
        self.power_clamp_warnings = 0;
    }

    fn expect_phase(&self, expected: EmitterPhase) -> CamToolResult<()> {
        if self.phase != expected {
            return Err(CamToolError::InvalidEmitterState {
                expected: expected.name(),
                found: self.phase.name(),
            });
        }
        Ok(())
    }

    pub fn add_header(&mut self, document_name: &str) -> CamToolResult<()> {
        self.expect_phase(EmitterPhase::Idle)?;
        self.lines.push("; BurnKit laser G-code".to_string());
        self.lines.push(format!(
            "; Generated: {}",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        ));
        self.lines.push(format!("; Document: {}", document_name));
        self.lines.push("G21 ; Set units to millimeters".to_string());
        self.lines.push("G90 ; Absolute positioning".to_string());
        self.lines.push("M5 ; Laser off".to_string());
        self.state = EmitterState {
            force_full: true,
            ..EmitterState::default()
        };
        self.phase = EmitterPhase::HeaderEmitted;
        Ok(())
    }

    pub fn add_comment(&mut self, text: &str) -> CamToolResult<()> {
        self.expect_phase(EmitterPhase::HeaderEmitted)?;
        self.lines.push(format!("; {}", text));
        Ok(())
    }

    /// Emit every pass of a job over already ordered segments.
    ///
    /// Cut and fill segments are burned at `power_max`; raster segments use
    /// their own per-point power list.
    pub fn add_job(
        &mut self,
        segments: &[PathSegment],
        job: &Job,
        job_index: usize,
    ) -> CamToolResult<()> {
        self.expect_phase(EmitterPhase::HeaderEmitted)?;
        if segments.is_empty() || job.passes == 0 {
            debug!("Job {} has nothing to emit", job_index);
            return Ok(());
        }
        if job.offset != 0.0 {
            debug!(
                "Job {} requests a {}mm contour offset; offsets are not applied",
                job_index, job.offset
            );
        }

        self.power_clamp_reported = false;
        self.last_origin = None;
        let speed = self.settings.clamp_speed(job.speed);
        let fixed_power = self.bounded_power(job.power_max);
        let mode = job.laser_mode.command();

        self.lines
            .push(format!("; Job: {} {} (id={})", job.kind(), job_index, job.id));
        if job.air_assist {
            self.lines.push("M8 ; Air assist on".to_string());
        }

        for pass in 1..=job.passes {
            if job.passes > 1 {
                self.lines.push(format!("; Pass {}/{}", pass, job.passes));
            }
            for segment in segments {
                self.emit_segment(segment, mode, fixed_power, speed);
            }
        }

        if job.air_assist {
            self.lines.push("M9 ; Air assist off".to_string());
        }
        Ok(())
    }

    fn emit_segment(&mut self, segment: &PathSegment, mode: &str, fixed_power: u32, speed: u32) {
        if self.last_origin.as_ref() != Some(segment.origin()) {
            self.lines.push(format!("; {}", segment.origin()));
            self.last_origin = Some(segment.origin().clone());
        }

        let powers: Vec<u32> = match segment.powers() {
            Some(powers) => powers.iter().map(|&p| self.bounded_power(f64::from(p))).collect(),
            None => vec![fixed_power; segment.len()],
        };

        self.rapid_to(segment.start_point());
        self.enable_laser(mode, powers[0]);
        for (point, power) in segment.points().iter().zip(&powers).skip(1) {
            self.cut_to(*point, *power, speed);
        }
        self.disable_laser();
    }

    fn bounded_power(&mut self, value: f64) -> u32 {
        let (power, clamped) = self.settings.bound_power(value);
        if clamped && !self.power_clamp_reported {
            warn!(
                "Power value {:.0} clamped to {} (max_power={})",
                value, power, self.settings.max_power
            );
            self.power_clamp_reported = true;
            self.power_clamp_warnings += 1;
        }
        power
    }

    fn format_coord(&self, value: f64) -> String {
        let text = format!("{:.*}", self.precision, value);
        // Avoid "-0.00" for values that round to zero.
        if text.starts_with('-') && text[1..].chars().all(|c| c == '0' || c == '.') {
            text[1..].to_string()
        } else {
            text
        }
    }

    fn rapid_to(&mut self, target: Point) {
        let feed = self.settings.travel_speed;
        self.write_move(Motion::Rapid, target, None, Some(feed));
    }

    fn cut_to(&mut self, target: Point, power: u32, speed: u32) {
        self.write_move(Motion::Cut, target, Some(power), Some(speed));
    }

    fn write_move(&mut self, motion: Motion, target: Point, power: Option<u32>, speed: Option<u32>) {
        let x = self.format_coord(target.x);
        let y = self.format_coord(target.y);
        let full = self.state.force_full || self.state.motion != Some(motion);

        let mut words: Vec<String> = Vec::with_capacity(5);
        if full {
            words.push(motion.word().to_string());
        }
        if full || self.state.x.as_deref() != Some(x.as_str()) {
            words.push(format!("X{}", x));
        }
        if full || self.state.y.as_deref() != Some(y.as_str()) {
            words.push(format!("Y{}", y));
        }
        if let Some(power) = power {
            if full || self.state.power != Some(power) {
                words.push(format!("S{}", power));
            }
        }
        if let Some(speed) = speed {
            if full || self.state.speed != Some(speed) {
                words.push(format!("F{}", speed));
            }
        }

        if words.is_empty() {
            return;
        }
        self.lines.push(words.join(" "));
        self.state.x = Some(x);
        self.state.y = Some(y);
        self.state.motion = Some(motion);
        if power.is_some() {
            self.state.power = power;
        }
        if speed.is_some() {
            self.state.speed = speed;
        }
        self.state.force_full = false;
    }

    fn enable_laser(&mut self, mode: &str, power: u32) {
        self.lines.push(format!("{} S{}", mode, power));
        self.state.power = Some(power);
        self.state.force_full = true;
    }

    fn disable_laser(&mut self) {
        self.lines.push("M5".to_string());
        self.state.force_full = true;
    }

    pub fn add_footer(&mut self) -> CamToolResult<()> {
        self.expect_phase(EmitterPhase::HeaderEmitted)?;
        self.lines.push("M5 ; Laser off".to_string());
        self.lines.push("M9 ; Air assist off".to_string());
        self.lines.push("G0 X0 Y0 ; Return to origin".to_string());
        self.lines.push("M2 ; End of program".to_string());
        self.phase = EmitterPhase::FooterEmitted;
        Ok(())
    }

    /// Close the program and return the whole command stream.
    pub fn finish(&mut self) -> CamToolResult<String> {
        self.expect_phase(EmitterPhase::FooterEmitted)?;
        self.phase = EmitterPhase::Closed;
        let mut gcode = self.lines.join("\n");
        gcode.push('\n');
        Ok(gcode)
    }
}
