use numstat::aggregator::{AggregateSummary, Aggregator, AggregatorState};
use numstat::render::{RenderMode, ReportRenderer};
use numstat_common::{Algorithm, ExecutionOutcome, TaskFailure};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tokio::sync::mpsc;

const ERASE_LINE: &str = "\x1b[1A\x1b[2K";

fn failure(task: usize, detail: &str) -> TaskFailure {
    TaskFailure { task, detail: detail.to_string() }
}

#[test]
fn test_state_machine_live() {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let renderer = ReportRenderer::new(&mut out, RenderMode::Live, 16);
    let mut agg = Aggregator::new(Algorithm::Simple, renderer, &mut err);

    assert_eq!(agg.state(), AggregatorState::Empty);
    agg.accept(ExecutionOutcome::Sample(1.0)).unwrap();
    assert_eq!(agg.state(), AggregatorState::Accumulating);
    agg.accept(ExecutionOutcome::Sample(2.0)).unwrap();
    assert_eq!(agg.state(), AggregatorState::Reporting);
    agg.accept(ExecutionOutcome::Sample(3.0)).unwrap();

    let summary = agg.finish().unwrap();
    assert_eq!(agg.state(), AggregatorState::Done);
    assert_eq!(summary, AggregateSummary { samples: 3, parse_failures: 0, process_failures: 0, reports: 2 });
    drop(agg);

    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.matches(ERASE_LINE).count(), 9);
    assert!(text.ends_with("100%:\t3\n"));
}

#[test]
fn test_single_sample_reported_on_finish() {
    let mut out = Vec::new();
    let renderer = ReportRenderer::new(&mut out, RenderMode::Live, 16);
    let mut agg = Aggregator::new(Algorithm::LinearInterpolation, renderer, Vec::new());

    agg.accept(ExecutionOutcome::Sample(4.5)).unwrap();
    let summary = agg.finish().unwrap();
    assert_eq!(summary.reports, 1);
    drop(agg);

    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().count(), 9);
    assert!(text.lines().all(|l| l.ends_with("\t4.5")));
}

#[test]
fn test_no_samples_writes_nothing() {
    let mut out = Vec::new();
    let renderer = ReportRenderer::new(&mut out, RenderMode::Batch, 16);
    let mut agg = Aggregator::new(Algorithm::Simple, renderer, Vec::new());

    let summary = agg.finish().unwrap();
    assert_eq!(summary.samples, 0);
    assert_eq!(summary.reports, 0);
    assert!(agg.snapshot().is_none());
    drop(agg);
    assert!(out.is_empty());
}

#[test]
fn test_failures_are_reported_not_inserted() {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let renderer = ReportRenderer::new(&mut out, RenderMode::Batch, 16);
    let mut agg = Aggregator::new(Algorithm::Simple, renderer, &mut err);

    agg.accept(ExecutionOutcome::Sample(1.0)).unwrap();
    agg.accept(ExecutionOutcome::ParseFailure(failure(1, "task #1 stdout: invalid float literal"))).unwrap();
    agg.accept(ExecutionOutcome::ProcessFailure(failure(2, "\"false\" exited with exit status: 1"))).unwrap();
    agg.accept(ExecutionOutcome::Sample(2.0)).unwrap();

    assert_eq!(agg.samples().as_slice(), &[1.0, 2.0]);
    let summary = agg.finish().unwrap();
    assert_eq!(summary.parse_failures, 1);
    assert_eq!(summary.process_failures, 1);
    assert_eq!(summary.reports, 1);
    drop(agg);

    let errors = String::from_utf8(err).unwrap();
    assert_eq!(
        errors,
        "number conversion error: task #1 stdout: invalid float literal\n\
         process error: task #2: \"false\" exited with exit status: 1\n"
    );
}

#[test]
fn test_arrival_order_does_not_change_report() {
    let mut values: Vec<f64> = (1..=50).map(|i| f64::from(i) * 0.75).collect();
    let mut rng = StdRng::seed_from_u64(7);

    let mut reports = Vec::new();
    for _ in 0..5 {
        values.shuffle(&mut rng);
        let renderer = ReportRenderer::new(Vec::new(), RenderMode::Batch, 16);
        let mut agg = Aggregator::new(Algorithm::LinearInterpolation, renderer, Vec::new());
        for v in &values {
            agg.accept(ExecutionOutcome::Sample(*v)).unwrap();
        }
        let sorted = agg.samples().as_slice();
        assert!(sorted.windows(2).all(|w| w[0] <= w[1]));
        reports.push(agg.snapshot().unwrap());
    }
    assert!(reports.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn test_consume_drains_until_senders_drop() {
    let (tx, mut rx) = mpsc::channel(2);
    let producer = tokio::spawn(async move {
        for v in [3.0, 1.0, 2.0] {
            tx.send(ExecutionOutcome::Sample(v)).await.unwrap();
        }
    });

    let renderer = ReportRenderer::new(Vec::new(), RenderMode::Batch, 16);
    let mut agg = Aggregator::new(Algorithm::Simple, renderer, Vec::new());
    agg.consume(&mut rx).await.unwrap();
    producer.await.unwrap();

    assert_eq!(agg.state(), AggregatorState::Draining);
    assert_eq!(agg.samples().as_slice(), &[1.0, 2.0, 3.0]);
    assert_eq!(agg.finish().unwrap().reports, 1);
}
