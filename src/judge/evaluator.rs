//! Verdict evaluation
//!
//! Test cases are fed in declaration order. A resource violation or runtime
//! error ends evaluation with no partial credit; a wrong answer is recorded
//! and evaluation continues, so the final score is the weight of every passing
//! case.

use crate::{
    constants::OUTPUT_PREVIEW_BYTES,
    models::{
        CaseResult, CaseStatus, JudgeOutcome, Problem, SubmissionStatus, TestCase, total_weight,
    },
    sandbox::RunOutput,
};

use super::compare::outputs_match;

/// Whether the caller should run the next test case
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Accumulates per-case results into a final outcome
#[derive(Debug)]
pub struct Evaluator {
    time_limit_ms: i64,
    memory_limit_kb: i64,
    float_epsilon: Option<f64>,
    tests_total: i32,
    total_weight: i32,
    passed: i32,
    passed_weight: i32,
    max_time_ms: i64,
    max_memory_kb: i64,
    /// First wrong answer, reported when nothing worse happens
    first_mismatch: Option<String>,
    stopped: Option<(SubmissionStatus, String)>,
    results: Vec<CaseResult>,
}

impl Evaluator {
    pub fn new(problem: &Problem, cases: &[TestCase]) -> Self {
        Self {
            time_limit_ms: i64::from(problem.time_limit_ms),
            memory_limit_kb: i64::from(problem.memory_limit_kb),
            float_epsilon: problem.float_epsilon,
            tests_total: cases.len() as i32,
            total_weight: total_weight(cases),
            passed: 0,
            passed_weight: 0,
            max_time_ms: 0,
            max_memory_kb: 0,
            first_mismatch: None,
            stopped: None,
            results: Vec::with_capacity(cases.len()),
        }
    }

    /// Classify one run. `number` is the 1-based position of the case.
    pub fn record(&mut self, number: usize, case: &TestCase, output: &RunOutput) -> Flow {
        self.max_time_ms = self.max_time_ms.max(output.time_ms);
        self.max_memory_kb = self.max_memory_kb.max(output.memory_kb);

        let status = if output.timed_out || output.time_ms > self.time_limit_ms {
            self.stop(
                SubmissionStatus::TimeLimit,
                format!("Time Limit Exceeded on test case {}", number),
            );
            CaseStatus::TimeLimit
        } else if output.memory_exceeded || output.memory_kb > self.memory_limit_kb {
            self.stop(
                SubmissionStatus::MemoryLimit,
                format!("Memory Limit Exceeded on test case {}", number),
            );
            CaseStatus::MemoryLimit
        } else if output.exit_code != 0 {
            let stderr = preview(&output.stderr);
            let message = if stderr.trim().is_empty() {
                format!(
                    "Runtime Error on test case {} (exit code {})",
                    number, output.exit_code
                )
            } else {
                format!("Runtime Error on test case {}: {}", number, stderr.trim_end())
            };
            self.stop(SubmissionStatus::RuntimeError, message);
            CaseStatus::RuntimeError
        } else if outputs_match(&output.stdout, &case.expected_output, self.float_epsilon) {
            self.passed += 1;
            self.passed_weight += case.weight;
            CaseStatus::Passed
        } else {
            self.first_mismatch
                .get_or_insert_with(|| format!("Wrong Answer on test case {}", number));
            CaseStatus::WrongAnswer
        };

        self.results.push(CaseResult {
            test_case_id: case.id,
            status,
            weight: case.weight,
            time_ms: output.time_ms,
            memory_kb: output.memory_kb,
            output_preview: Some(preview(&output.stdout).to_string()),
        });

        if self.stopped.is_some() {
            Flow::Stop
        } else {
            Flow::Continue
        }
    }

    fn stop(&mut self, status: SubmissionStatus, message: String) {
        self.stopped = Some((status, message));
    }

    pub fn finish(self) -> JudgeOutcome {
        let (status, score, error_message) = match self.stopped {
            Some((status, message)) => (status, 0, Some(message)),
            None if self.passed == self.tests_total => {
                (SubmissionStatus::Accepted, self.total_weight, None)
            }
            None => (
                SubmissionStatus::WrongAnswer,
                self.passed_weight,
                self.first_mismatch,
            ),
        };

        let execution_time_ms = if status == SubmissionStatus::TimeLimit {
            self.max_time_ms.max(self.time_limit_ms)
        } else {
            self.max_time_ms
        };

        JudgeOutcome {
            status,
            score: Some(score),
            execution_time_ms: Some(execution_time_ms),
            memory_usage_kb: Some(self.max_memory_kb),
            tests_passed: Some(self.passed),
            tests_total: Some(self.tests_total),
            error_message,
            case_results: self.results,
        }
    }
}

/// Longest prefix of `s` within the preview budget, cut on a char boundary
fn preview(s: &str) -> &str {
    if s.len() <= OUTPUT_PREVIEW_BYTES {
        return s;
    }
    let mut end = OUTPUT_PREVIEW_BYTES;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn problem(float_epsilon: Option<f64>) -> Problem {
        Problem {
            id: Uuid::new_v4(),
            title: "Echo".to_string(),
            time_limit_ms: 2_000,
            memory_limit_kb: 65_536,
            float_epsilon,
            created_at: Utc::now(),
        }
    }

    fn cases(weights: &[i32]) -> Vec<TestCase> {
        weights
            .iter()
            .enumerate()
            .map(|(i, &weight)| TestCase {
                id: Uuid::new_v4(),
                problem_id: Uuid::nil(),
                input: String::new(),
                expected_output: format!("{}\n", i),
                weight,
                position: i as i32,
            })
            .collect()
    }

    fn ok(stdout: impl Into<String>) -> RunOutput {
        RunOutput {
            stdout: stdout.into(),
            time_ms: 10,
            memory_kb: 1_024,
            ..Default::default()
        }
    }

    fn evaluate(problem: &Problem, cases: &[TestCase], outputs: Vec<RunOutput>) -> JudgeOutcome {
        let mut evaluator = Evaluator::new(problem, cases);
        for (i, (case, output)) in cases.iter().zip(outputs.iter()).enumerate() {
            if evaluator.record(i + 1, case, output) == Flow::Stop {
                break;
            }
        }
        evaluator.finish()
    }

    #[test]
    fn test_all_pass_is_accepted_with_full_score() {
        let cases = cases(&[1, 2, 3]);
        let outcome = evaluate(&problem(None), &cases, vec![ok("0"), ok("1\n"), ok("2  \n")]);

        assert_eq!(outcome.status, SubmissionStatus::Accepted);
        assert_eq!(outcome.score, Some(6));
        assert_eq!(outcome.tests_passed, Some(3));
        assert_eq!(outcome.error_message, None);
    }

    #[test]
    fn test_mismatch_scores_passing_weights() {
        let cases = cases(&[1, 2, 3]);
        let outcome = evaluate(&problem(None), &cases, vec![ok("0"), ok("x"), ok("2")]);

        assert_eq!(outcome.status, SubmissionStatus::WrongAnswer);
        assert_eq!(outcome.score, Some(4));
        assert_eq!(outcome.tests_passed, Some(2));
        assert_eq!(outcome.case_results.len(), 3);
        assert_eq!(
            outcome.error_message.as_deref(),
            Some("Wrong Answer on test case 2")
        );
    }

    #[test]
    fn test_timeout_stops_with_no_credit() {
        let cases = cases(&[5, 5]);
        let slow = RunOutput {
            timed_out: true,
            time_ms: 1_200,
            ..Default::default()
        };
        let outcome = evaluate(&problem(None), &cases, vec![ok("0"), slow]);

        assert_eq!(outcome.status, SubmissionStatus::TimeLimit);
        assert_eq!(outcome.score, Some(0));
        // never reported below the limit
        assert_eq!(outcome.execution_time_ms, Some(2_000));
        assert_eq!(
            outcome.error_message.as_deref(),
            Some("Time Limit Exceeded on test case 2")
        );
    }

    #[test]
    fn test_resource_violation_beats_mismatch() {
        let cases = cases(&[1, 1, 1]);
        let hog = RunOutput {
            memory_kb: 70_000,
            ..ok("2")
        };
        let outcome = evaluate(&problem(None), &cases, vec![ok("wrong"), hog, ok("2")]);

        assert_eq!(outcome.status, SubmissionStatus::MemoryLimit);
        assert_eq!(outcome.score, Some(0));
        assert_eq!(outcome.case_results.len(), 2);
    }

    #[test]
    fn test_runtime_error_stops_evaluation() {
        let cases = cases(&[1, 1, 1]);
        let crash = RunOutput {
            exit_code: 1,
            stderr: "Traceback (most recent call last):\nZeroDivisionError\n".to_string(),
            ..ok("")
        };
        let outcome = evaluate(&problem(None), &cases, vec![ok("0"), crash, ok("2")]);

        assert_eq!(outcome.status, SubmissionStatus::RuntimeError);
        assert_eq!(outcome.score, Some(0));
        assert_eq!(outcome.tests_passed, Some(1));
        assert!(
            outcome
                .error_message
                .unwrap()
                .starts_with("Runtime Error on test case 2: Traceback")
        );
    }

    #[test]
    fn test_timeout_takes_precedence_over_exit_code() {
        let cases = cases(&[1]);
        let killed = RunOutput {
            exit_code: 124,
            timed_out: true,
            time_ms: 2_100,
            ..Default::default()
        };
        let outcome = evaluate(&problem(None), &cases, vec![killed]);

        assert_eq!(outcome.status, SubmissionStatus::TimeLimit);
        assert_eq!(outcome.execution_time_ms, Some(2_100));
    }

    #[test]
    fn test_float_epsilon_applies() {
        let mut cases = cases(&[1]);
        cases[0].expected_output = "0.333333".to_string();
        let outcome = evaluate(&problem(Some(1e-4)), &cases, vec![ok("0.33334")]);

        assert_eq!(outcome.status, SubmissionStatus::Accepted);
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let long = "é".repeat(OUTPUT_PREVIEW_BYTES);
        let cut = preview(&long);
        assert!(cut.len() <= OUTPUT_PREVIEW_BYTES);
        assert!(cut.chars().all(|c| c == 'é'));
    }
}
