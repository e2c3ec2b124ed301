#[cfg(feature = "sound")]
use rodio::Source;
use std::f32::consts::PI;
use std::time::Duration;

const SAMPLE_RATE: u32 = 44100;
const ATTACK_SECS: f32 = 0.01;
const PEAK_GAIN: f32 = 0.5;
const FLOOR_GAIN: f32 = 0.00001;

/// Short alert tone: sine with a 10 ms linear attack and an exponential
/// decay to silence at the end of the duration.
pub struct Chime {
    frequency: f32,
    sample_rate: u32,
    total_samples: usize,
    num_sample: usize,
    volume: f32,
}

impl Chime {
    pub fn new(frequency: f32, duration: Duration, volume: f32) -> Self {
        Self {
            frequency,
            sample_rate: SAMPLE_RATE,
            total_samples: (duration.as_secs_f32() * SAMPLE_RATE as f32) as usize,
            num_sample: 0,
            volume: volume.clamp(0.0, 1.0),
        }
    }

    /// A4 for half a second.
    pub fn alert(volume: f32) -> Self {
        Self::new(440.0, Duration::from_millis(500), volume)
    }

    fn envelope(&self, t: f32) -> f32 {
        if t < ATTACK_SECS {
            return PEAK_GAIN * t / ATTACK_SECS;
        }
        let duration = self.total_samples as f32 / self.sample_rate as f32;
        let decay_span = (duration - ATTACK_SECS).max(f32::EPSILON);
        let progress = ((t - ATTACK_SECS) / decay_span).min(1.0);
        PEAK_GAIN * (FLOOR_GAIN / PEAK_GAIN).powf(progress)
    }
}

impl Iterator for Chime {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.num_sample >= self.total_samples {
            return None;
        }
        let t = self.num_sample as f32 / self.sample_rate as f32;
        self.num_sample += 1;

        let sample = (2.0 * PI * self.frequency * t).sin();
        Some(sample * self.envelope(t) * self.volume)
    }
}

#[cfg(feature = "sound")]
impl Source for Chime {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.total_samples - self.num_sample)
    }

    fn channels(&self) -> u16 {
        1 // Mono
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f32(
            self.total_samples as f32 / self.sample_rate as f32,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_chime_is_half_a_second() {
        assert_eq!(Chime::alert(1.0).count(), 22050);
    }

    #[test]
    fn chime_starts_silent_and_stays_below_peak() {
        let samples: Vec<f32> = Chime::alert(1.0).collect();
        assert_eq!(samples[0], 0.0);
        assert!(samples.iter().all(|s| s.abs() <= PEAK_GAIN + f32::EPSILON));
    }

    #[test]
    fn chime_fades_out() {
        let samples: Vec<f32> = Chime::alert(1.0).collect();
        let tail_peak = samples[samples.len() - 200..]
            .iter()
            .fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!(tail_peak < 0.01);
    }

    #[test]
    fn volume_scales_output() {
        let loud: f32 = Chime::alert(1.0).map(f32::abs).sum();
        let quiet: f32 = Chime::alert(0.5).map(f32::abs).sum();
        assert!((quiet * 2.0 - loud).abs() < loud * 0.001);
    }
}
