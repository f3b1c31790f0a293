use std::{
    cell::RefCell,
    fs::File,
    io::{self, BufRead, BufReader, Lines},
    path::Path,
};

use indicatif::ProgressBar;
use log::{debug, info, trace};
use rayon::{
    iter::{IntoParallelRefIterator, ParallelIterator},
    ThreadPool, ThreadPoolBuilder,
};
use thread_local::ThreadLocal;

use crate::{
    calculator::Calculator,
    config::Config,
    error::{Error, Result},
    record::{DescribedRecord, Record},
    utils::{count_lines, open_input, progress_bar},
};

/// Runs a [Calculator] over lines of input on a dedicated worker pool. Each
/// worker thread builds its own calculator from `factory` the first time it
/// needs one and keeps it for as long as the pipeline lives
pub struct Pipeline<C: Send, F> {
    pool: ThreadPool,
    factory: F,
    calculators: ThreadLocal<RefCell<C>>,
    batch_size: usize,
}

impl<C, F> Pipeline<C, F>
where
    C: Calculator + Send,
    F: Fn() -> C + Sync,
{
    pub fn new(factory: F) -> Result<Self> {
        Self::with_config(factory, &Config::default())
    }

    pub fn with_config(factory: F, config: &Config) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|i| format!("rdescribe-worker-{i}"))
            .build()
            .map_err(|e| {
                Error::Config(format!("failed to build thread pool: {e}"))
            })?;
        let batch_size = config.batch_size.max(1);
        info!(
            "initialized pipeline with {} workers, batch size {batch_size}",
            pool.current_num_threads(),
        );
        Ok(Self {
            pool,
            factory,
            calculators: ThreadLocal::new(),
            batch_size,
        })
    }

    /// the number of worker threads in the pool
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// lazily parse and describe each line of `lines`, in order. nothing is
    /// read or computed until the returned iterator is advanced
    pub fn from_source<I, S>(
        &self,
        lines: I,
        progress: Option<ProgressBar>,
    ) -> Records<'_, C, F, I::IntoIter>
    where
        I: IntoIterator<Item = io::Result<S>>,
        S: AsRef<str> + Sync,
    {
        Records {
            pipeline: self,
            lines: lines.into_iter(),
            progress,
            batch: Vec::new().into_iter(),
            stage: Stage::Streaming,
        }
    }

    pub fn from_list<I, S>(
        &self,
        lines: I,
        progress: Option<ProgressBar>,
    ) -> Records<'_, C, F, impl Iterator<Item = io::Result<S>>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str> + Sync,
    {
        self.from_source(lines.into_iter().map(Ok), progress)
    }

    /// stream the lines of the file at `path`. the file is opened right away,
    /// so a missing or unreadable input is reported before any work starts
    pub fn from_file(
        &self,
        path: impl AsRef<Path>,
        progress: Option<ProgressBar>,
    ) -> Result<Records<'_, C, F, Lines<BufReader<File>>>> {
        let path = path.as_ref();
        let f = open_input(path)?;
        info!("streaming records from {}", path.display());
        Ok(self.from_source(BufReader::new(f).lines(), progress))
    }

    /// like [Pipeline::from_file], but count the lines in `path` first to size
    /// a progress bar. this reads the file twice
    pub fn from_file_counted(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<Records<'_, C, F, Lines<BufReader<File>>>> {
        let path = path.as_ref();
        let n = count_lines(path)?;
        info!("{} contains {n} lines", path.display());
        self.from_file(path, Some(progress_bar(n as u64)))
    }

    /// describe a single line on the calling worker, reusing its calculator
    fn describe(&self, line: &str) -> Result<DescribedRecord> {
        let record = Record::parse(line)?;
        let cell = self.calculators.get_or(|| {
            debug!(
                "creating calculator for {}",
                std::thread::current().name().unwrap_or("unnamed thread")
            );
            RefCell::new((self.factory)())
        });
        trace!("describing {}", record.structure());
        cell.borrow_mut()
            .describe_record(record)
            .map_err(Error::calculation)
    }

    /// map `lines` across the pool. the indexed parallel iterator collects in
    /// input order no matter which worker finishes first
    fn process<S>(
        &self,
        lines: &[S],
        progress: Option<&ProgressBar>,
    ) -> Vec<Result<DescribedRecord>>
    where
        S: AsRef<str> + Sync,
    {
        debug!("dispatching batch of {} lines", lines.len());
        self.pool.install(|| {
            lines
                .par_iter()
                .map(|line| {
                    if let Some(bar) = progress {
                        bar.inc(1);
                    }
                    self.describe(line.as_ref())
                })
                .collect()
        })
    }
}

/// Where a [Records] iterator is in its run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// more input may remain in the source
    Streaming,
    /// the source is exhausted, but buffered results remain
    Draining,
    /// every record has been yielded
    Done,
    /// an error was yielded, and nothing more will be
    Failed,
}

/// The lazy, ordered output of a [Pipeline]. Input is pulled in batches as the
/// iterator is consumed, and the first error ends the iteration
pub struct Records<'p, C: Send, F, I> {
    pipeline: &'p Pipeline<C, F>,
    lines: I,
    progress: Option<ProgressBar>,
    batch: std::vec::IntoIter<Result<DescribedRecord>>,
    stage: Stage,
}

impl<C, F, I, S> Records<'_, C, F, I>
where
    C: Calculator + Send,
    F: Fn() -> C + Sync,
    I: Iterator<Item = io::Result<S>>,
    S: AsRef<str> + Sync,
{
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// read up to one batch of lines from the source and compute them
    fn fill(&mut self) {
        let size = self.pipeline.batch_size;
        let mut lines = Vec::with_capacity(size);
        let mut read_error = None;
        while lines.len() < size {
            match self.lines.next() {
                Some(Ok(line)) => lines.push(line),
                Some(Err(e)) => {
                    read_error = Some(e);
                    break;
                }
                None => {
                    debug!("input exhausted");
                    self.stage = Stage::Draining;
                    break;
                }
            }
        }
        let mut results = self.pipeline.process(&lines, self.progress.as_ref());
        if let Some(e) = read_error {
            results.push(Err(Error::Io(e)));
            self.stage = Stage::Draining;
        }
        self.batch = results.into_iter();
    }
}

impl<C, F, I, S> Iterator for Records<'_, C, F, I>
where
    C: Calculator + Send,
    F: Fn() -> C + Sync,
    I: Iterator<Item = io::Result<S>>,
    S: AsRef<str> + Sync,
{
    type Item = Result<DescribedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.stage {
                Stage::Done | Stage::Failed => return None,
                Stage::Streaming | Stage::Draining => {
                    if let Some(item) = self.batch.next() {
                        if let Err(e) = &item {
                            debug!("stopping after error: {e}");
                            self.stage = Stage::Failed;
                            if let Some(bar) = &self.progress {
                                bar.abandon();
                            }
                        }
                        return Some(item);
                    }
                    if self.stage == Stage::Draining {
                        self.stage = Stage::Done;
                        if let Some(bar) = &self.progress {
                            bar.finish();
                        }
                        return None;
                    }
                    self.fill();
                }
            }
        }
    }
}
