use crate::record::{DescribedRecord, Record};

/// The name and a short human-readable summary of one descriptor
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Descriptor {
    pub name: &'static str,
    pub summary: &'static str,
}

/// A stateful descriptor engine. Each pipeline worker owns exactly one
/// `Calculator` for the whole run, so implementations are free to keep
/// expensive setup or scratch space around between calls. Taking `&mut self`
/// means a single instance can never be driven concurrently
pub trait Calculator {
    type Error: std::error::Error + Send + Sync + 'static;

    /// compute the full, fixed-order descriptor vector for `structure`.
    /// failures should be reported, not papered over with NaNs
    fn calculate(&mut self, structure: &str) -> Result<Vec<f64>, Self::Error>;

    /// the descriptors produced by [Calculator::calculate], in output order
    fn describe(&self) -> Vec<Descriptor>;

    fn describe_record(
        &mut self,
        record: Record,
    ) -> Result<DescribedRecord, Self::Error> {
        let values = self.calculate(record.structure())?;
        Ok(record.attach_descriptors(values))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{collections::HashMap, thread::sleep, time::Duration};

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("no descriptors known for {0}")]
    pub(crate) struct Unknown(pub(crate) String);

    /// a lookup-table calculator for exercising the pipeline. structures in
    /// `slow` sleep before answering to shuffle completion order
    #[derive(Clone, Default)]
    pub(crate) struct Fake {
        pub(crate) table: HashMap<String, Vec<f64>>,
        pub(crate) slow: Vec<String>,
        pub(crate) calls: usize,
    }

    impl Fake {
        pub(crate) fn with(mut self, structure: &str, values: &[f64]) -> Self {
            self.table.insert(structure.to_owned(), values.to_vec());
            self
        }

        pub(crate) fn slow(mut self, structure: &str) -> Self {
            self.slow.push(structure.to_owned());
            self
        }
    }

    impl Calculator for Fake {
        type Error = Unknown;

        fn calculate(
            &mut self,
            structure: &str,
        ) -> Result<Vec<f64>, Self::Error> {
            self.calls += 1;
            if self.slow.iter().any(|s| s == structure) {
                sleep(Duration::from_millis(50));
            }
            self.table
                .get(structure)
                .cloned()
                .ok_or_else(|| Unknown(structure.to_owned()))
        }

        fn describe(&self) -> Vec<Descriptor> {
            vec![Descriptor {
                name: "fake",
                summary: "table lookup",
            }]
        }
    }

    #[test]
    fn describe_record() {
        let mut calc = Fake::default().with("CCO", &[1.0, 2.0]);
        let rec = Record::parse("a\tCCO").unwrap();
        let got = calc.describe_record(rec).unwrap();
        assert_eq!(got.descriptors(), &[1.0, 2.0]);
        assert_eq!(got.extra(), &["a".to_owned()]);

        let rec = Record::parse("a\tCCN").unwrap();
        let err = calc.describe_record(rec).unwrap_err();
        assert_eq!(err.to_string(), "no descriptors known for CCN");
        assert_eq!(calc.calls, 2);
    }
}
