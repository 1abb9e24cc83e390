//! Offline tables for signatures and burst plans.

use serde::Serialize;

use tact_core::{
    HapticSignature, ImpactStyle, SignatureFrame, TactileFrame, blend, burst_schedule,
    cells_for_text, elapsed_at, idle_bed, raised_count,
};

#[derive(Debug, Clone, Serialize)]
pub struct SignatureRow {
    pub tick: u64,
    pub at_ms: u64,
    pub frame: SignatureFrame,
    pub output: TactileFrame,
}

/// The first `ticks` ticks of `signature` at a fixed density, unboosted.
pub fn signature_rows(signature: HapticSignature, ticks: u64, density: i32) -> Vec<SignatureRow> {
    let interval = signature.tick_interval();
    (0..ticks)
        .map(|tick| {
            let elapsed = elapsed_at(tick, interval);
            let frame = signature.frame(tick, elapsed);
            SignatureRow {
                tick,
                at_ms: (elapsed * 1000.0).round() as u64,
                frame,
                output: blend(signature, &frame, density, false),
            }
        })
        .collect()
}

pub fn format_signature_table(signature: HapticSignature, rows: &[SignatureRow]) -> String {
    let idle = idle_bed(signature);
    let mut out = format!(
        "{signature}: intensity {:.2}, every {}ms, sharpness {:.2}\nidle bed {:.3} / {:.3}\n",
        signature.intensity(),
        signature.tick_interval().as_millis(),
        signature.sharpness(),
        idle.intensity,
        idle.sharpness,
    );
    out.push_str("tick    ms  active   tick     bed  sharp\n");
    for row in rows {
        let tick = row
            .output
            .tick
            .map_or_else(|| "     -".to_string(), |t| format!("{t:.3}"));
        out.push_str(&format!(
            "{:>4} {:>5}  {:<6} {:>6}  {:.3}  {:.3}\n",
            row.tick,
            row.at_ms,
            if row.frame.tick_active { "yes" } else { "no" },
            tick,
            row.output.bed.intensity,
            row.output.bed.sharpness,
        ));
    }
    out
}

#[derive(Debug, Clone, Serialize)]
pub struct PulseRow {
    pub dot: u8,
    pub delay_ms: u64,
    pub style: ImpactStyle,
    pub intensity: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CellPlan {
    pub ch: char,
    pub mask: u8,
    pub raised: i32,
    pub pulses: Vec<PulseRow>,
}

/// One plan per character; characters without a cell get an empty plan.
pub fn burst_plans(text: &str) -> Vec<CellPlan> {
    text.chars()
        .zip(cells_for_text(text))
        .map(|(ch, mask)| {
            let pulses = burst_schedule(mask)
                .into_iter()
                .map(|p| PulseRow {
                    dot: p.dot,
                    delay_ms: p.delay.as_millis() as u64,
                    style: p.impulse.style,
                    intensity: p.impulse.intensity,
                })
                .collect();
            CellPlan {
                ch,
                mask,
                raised: raised_count(mask),
                pulses,
            }
        })
        .collect()
}

pub fn format_burst(plans: &[CellPlan]) -> String {
    plans
        .iter()
        .map(|plan| {
            let pulses = plan
                .pulses
                .iter()
                .map(|p| format!("{}@{}ms {:?} {:.2}", p.dot, p.delay_ms, p.style, p.intensity))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{:?} {:06b} [{}] {}", plan.ch, plan.mask, plan.raised, pulses)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_rows_follow_cadence() {
        let rows = signature_rows(HapticSignature::Anger, 6, 0);
        let at: Vec<u64> = rows.iter().map(|r| r.at_ms).collect();
        assert_eq!(at, [18, 36, 54, 72, 90, 108]);

        let active: Vec<bool> = rows.iter().map(|r| r.output.tick.is_some()).collect();
        assert_eq!(active, [true, true, false, true, false, false]);
    }

    #[test]
    fn test_signature_table_marks_suppressed_ticks() {
        let rows = signature_rows(HapticSignature::Anger, 3, 0);
        let table = format_signature_table(HapticSignature::Anger, &rows);
        assert!(table.starts_with("anger: intensity 0.95, every 18ms"));
        assert_eq!(table.lines().count(), 3 + 3);
        assert!(table.lines().last().unwrap().contains(" -"));
    }

    #[test]
    fn test_burst_plans() {
        let plans = burst_plans("b ");
        assert_eq!(plans.len(), 2);

        let b = &plans[0];
        assert_eq!(b.mask, 0b000011);
        assert_eq!(b.raised, 2);
        let dots: Vec<(u8, u64)> = b.pulses.iter().map(|p| (p.dot, p.delay_ms)).collect();
        assert_eq!(dots, [(1, 0), (2, 20)]);
        assert_eq!(b.pulses[1].style, ImpactStyle::Medium);

        assert_eq!(plans[1].mask, 0);
        assert!(plans[1].pulses.is_empty());
    }

    #[test]
    fn test_format_burst_line() {
        let text = format_burst(&burst_plans("a"));
        assert_eq!(text, "'a' 000001 [1] 1@0ms Rigid 1.00");
    }
}
