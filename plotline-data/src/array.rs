//! Tick arithmetic shared by the continuous scale families and the bin
//! transform.

const E10: f64 = 7.071067811865476; // sqrt(50)
const E5: f64 = 3.1622776601683795; // sqrt(10)
const E2: f64 = 1.4142135623730951; // sqrt(2)

/// Step size for ~`count` ticks between `start` and `stop`. A positive
/// result is the step itself; a negative result is the reciprocal of a
/// sub-unit step.
pub fn tick_increment(start: f64, stop: f64, count: f64) -> f64 {
    let step = (stop - start) / count.max(1.0);
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= E10 {
        10.0
    } else if error >= E5 {
        5.0
    } else if error >= E2 {
        2.0
    } else {
        1.0
    };
    if power >= 0.0 {
        factor * 10f64.powf(power)
    } else {
        -(10f64.powf(-power)) / factor
    }
}

/// Extend `[start, stop]` outward to tick-aligned bounds, iterating until
/// the step stabilizes.
pub fn nice_interval(start: f64, stop: f64, count: usize) -> (f64, f64) {
    if start == stop || !start.is_finite() || !stop.is_finite() {
        return (start, stop);
    }
    let (mut lo, mut hi, flipped) = if start <= stop {
        (start, stop, false)
    } else {
        (stop, start, true)
    };

    let mut prestep = 0.0;
    for _ in 0..10 {
        let step = tick_increment(lo, hi, count as f64);
        if step == prestep {
            break;
        } else if step > 0.0 {
            lo = (lo / step).floor() * step;
            hi = (hi / step).ceil() * step;
        } else if step < 0.0 {
            lo = (lo * -step).floor() / -step;
            hi = (hi * -step).ceil() / -step;
        } else {
            break;
        }
        prestep = step;
    }

    if flipped {
        (hi, lo)
    } else {
        (lo, hi)
    }
}

/// Tick values covering `[start, stop]` at the nice step.
pub fn ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if start == stop {
        return vec![start];
    }
    let step = tick_increment(start, stop, count as f64);
    if step == 0.0 || !step.is_finite() {
        return Vec::new();
    }
    if step > 0.0 {
        let first = (start / step).ceil();
        let last = (stop / step).floor();
        (first as i64..=last as i64).map(|i| i as f64 * step).collect()
    } else {
        let inv = -step;
        let first = (start * inv).ceil();
        let last = (stop * inv).floor();
        (first as i64..=last as i64).map(|i| i as f64 / inv).collect()
    }
}
