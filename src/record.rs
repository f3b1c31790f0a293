use std::{fmt::Display, str::FromStr};

use crate::error::{Error, Result};

/// A single parsed input line: any number of leading metadata fields followed
/// by a structure (SMILES) in the last tab-separated field
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    extra: Vec<String>,
    structure: String,
}

impl Record {
    /// split `line` on literal tabs, taking the last field as the structure and
    /// everything before it as metadata. metadata fields are kept verbatim,
    /// but the structure must not be blank
    pub fn parse(line: &str) -> Result<Self> {
        let (extra, structure) = match line.rsplit_once('\t') {
            Some((head, last)) => {
                (head.split('\t').map(str::to_owned).collect(), last)
            }
            None => (Vec::new(), line),
        };
        if structure.trim().is_empty() {
            return Err(Error::invalid_record(line, "blank structure field"));
        }
        Ok(Self {
            extra,
            structure: structure.to_owned(),
        })
    }

    pub fn extra(&self) -> &[String] {
        &self.extra
    }

    pub fn structure(&self) -> &str {
        &self.structure
    }

    /// consume `self` and pair it with its computed descriptor `values`
    pub fn attach_descriptors(self, values: Vec<f64>) -> DescribedRecord {
        DescribedRecord {
            record: self,
            descriptors: values,
        }
    }
}

impl FromStr for Record {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for field in &self.extra {
            write!(f, "{field}\t")?;
        }
        write!(f, "{}", self.structure)
    }
}

/// A [Record] with its descriptor values attached. This is the only way to get
/// at descriptors, so they can never be read before they are computed
#[derive(Clone, Debug, PartialEq)]
pub struct DescribedRecord {
    record: Record,
    descriptors: Vec<f64>,
}

impl DescribedRecord {
    /// parse a line previously written by the [Display] impl, where the last
    /// `n_descriptors` fields are descriptor values
    pub fn parse(line: &str, n_descriptors: usize) -> Result<Self> {
        let mut fields = line.rsplitn(n_descriptors + 1, '\t');
        let mut descriptors = Vec::with_capacity(n_descriptors);
        for _ in 0..n_descriptors {
            let Some(field) = fields.next() else {
                return Err(Error::invalid_record(
                    line,
                    format!("expected {n_descriptors} descriptor fields"),
                ));
            };
            let value = field.parse::<f64>().map_err(|e| {
                Error::invalid_record(
                    line,
                    format!("bad descriptor value {field:?}: {e}"),
                )
            })?;
            descriptors.push(value);
        }
        descriptors.reverse();
        let Some(rest) = fields.next() else {
            return Err(Error::invalid_record(line, "missing structure field"));
        };
        Ok(Record::parse(rest)?.attach_descriptors(descriptors))
    }

    pub fn extra(&self) -> &[String] {
        self.record.extra()
    }

    pub fn structure(&self) -> &str {
        self.record.structure()
    }

    pub fn descriptors(&self) -> &[f64] {
        &self.descriptors
    }

    /// split back into the parsed record and its descriptor values
    pub fn into_parts(self) -> (Record, Vec<f64>) {
        (self.record, self.descriptors)
    }
}

impl Display for DescribedRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.record)?;
        // Debug for f64 is the shortest representation that parses back to
        // the same value, and it keeps the trailing .0 on whole numbers
        for d in &self.descriptors {
            write!(f, "\t{d:?}")?;
        }
        Ok(())
    }
}
