use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::sync::Arc;
use std::thread;

use crate::blocklist::{AddKeyword, BlockList};
use crate::logger::AsyncLogger;
use crate::model::error::AppError;
use crate::model::event::{EventInput, EventKind, ProducerSummary};

/// Replays a scripted event file with one thread per producer, all sharing
/// one logger and one block-list.
pub struct EventReplayer {
    logger: Arc<AsyncLogger>,
    blocklist: Arc<BlockList>,
    summaries: Vec<ProducerSummary>,
}

impl EventReplayer {
    pub fn new(logger: Arc<AsyncLogger>, blocklist: Arc<BlockList>) -> Self {
        EventReplayer {
            logger,
            blocklist,
            summaries: Vec::new(),
        }
    }

    pub fn process_file(&mut self, file_path: &str) -> Result<(), AppError> {
        let file = File::open(file_path)?;
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(file);

        let mut scripts: HashMap<String, Vec<EventInput>> = HashMap::new();
        for result in reader.deserialize() {
            let record: EventInput = result?;
            scripts.entry(record.producer.clone()).or_default().push(record);
        }

        self.run_concurrently(scripts)
    }

    fn run_concurrently(
        &mut self,
        scripts: HashMap<String, Vec<EventInput>>,
    ) -> Result<(), AppError> {
        let results: Vec<thread::Result<ProducerSummary>> = thread::scope(|scope| {
            let handles: Vec<_> = scripts
                .into_iter()
                .map(|(producer, events)| {
                    let logger = Arc::clone(&self.logger);
                    let blocklist = Arc::clone(&self.blocklist);
                    scope.spawn(move || replay_producer(producer, events, &logger, &blocklist))
                })
                .collect();

            handles.into_iter().map(|h| h.join()).collect()
        });

        for result in results {
            let summary =
                result.map_err(|_| AppError::ReplayError("producer thread panicked".to_string()))?;
            self.summaries.push(summary);
        }
        self.summaries.sort_by(|a, b| a.producer.cmp(&b.producer));

        Ok(())
    }

    pub fn summaries(&self) -> &[ProducerSummary] {
        &self.summaries
    }

    pub fn write_summaries<W: Write>(&self, out: W) -> Result<(), AppError> {
        let mut writer = csv::Writer::from_writer(out);
        for summary in &self.summaries {
            writer.serialize(summary)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn output_summaries(&self) -> Result<(), AppError> {
        self.write_summaries(std::io::stdout())
    }
}

fn replay_producer(
    producer: String,
    events: Vec<EventInput>,
    logger: &AsyncLogger,
    blocklist: &BlockList,
) -> ProducerSummary {
    let mut blocked = 0;
    let mut keywords_added = false;

    for event in &events {
        match event.kind {
            EventKind::Log => logger.log_event(&event.text),
            EventKind::Navigate => {
                if blocklist.check_navigation(&event.text).is_some() {
                    blocked += 1;
                }
            }
            EventKind::Block => {
                if let AddKeyword::Added(_) = blocklist.add(&event.text) {
                    keywords_added = true;
                }
            }
        }
    }

    if keywords_added {
        // failure is already logged by save()
        let _ = blocklist.save();
    }

    ProducerSummary {
        producer,
        events: events.len(),
        blocked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn replays_each_producer_in_file_order() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("replay.log");
        let script = dir.path().join("events.csv");
        fs::write(
            &script,
            "producer,kind,text\n\
             ui,log,first\n\
             db,log,Step 1\n\
             ui,navigate,https://casino.example\n\
             db,log,Step 2\n\
             ui,block,news\n\
             ui,navigate,https://news.example\n\
             ui,log,last\n",
        )
        .unwrap();

        let logger = Arc::new(AsyncLogger::open(&log_path).unwrap());
        let blocklist = Arc::new(BlockList::new(dir.path().join("kw.txt"), Arc::clone(&logger)));
        blocklist.add("casino");

        let mut replayer = EventReplayer::new(Arc::clone(&logger), Arc::clone(&blocklist));
        replayer.process_file(script.to_str().unwrap()).unwrap();
        logger.close();

        assert_eq!(
            replayer.summaries(),
            &[
                ProducerSummary { producer: "db".to_string(), events: 2, blocked: 0 },
                ProducerSummary { producer: "ui".to_string(), events: 5, blocked: 2 },
            ]
        );

        let log = fs::read_to_string(&log_path).unwrap();
        let pos = |needle: &str| log.find(needle).unwrap();
        assert!(pos("] first") < pos("casino.example"));
        assert!(pos("Blocked keyword added: 'news'") < pos("news.example"));
        assert!(pos("] Step 1") < pos("] Step 2"));
        assert!(fs::read_to_string(dir.path().join("kw.txt")).unwrap().contains("news"));
    }

    #[test]
    fn summaries_are_written_as_csv() {
        let dir = tempdir().unwrap();
        let logger = Arc::new(AsyncLogger::open(dir.path().join("r.log")).unwrap());
        let blocklist = Arc::new(BlockList::new(dir.path().join("kw.txt"), Arc::clone(&logger)));

        let mut replayer = EventReplayer::new(logger, blocklist);
        replayer.summaries.push(ProducerSummary {
            producer: "a".to_string(),
            events: 3,
            blocked: 1,
        });

        let mut out = Vec::new();
        replayer.write_summaries(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "producer,events,blocked\na,3,1\n");
    }

    #[test]
    fn malformed_kind_is_a_csv_error() {
        let dir = tempdir().unwrap();
        let script = dir.path().join("bad.csv");
        fs::write(&script, "producer,kind,text\nui,explode,x\n").unwrap();

        let logger = Arc::new(AsyncLogger::open(dir.path().join("r.log")).unwrap());
        let blocklist = Arc::new(BlockList::new(dir.path().join("kw.txt"), Arc::clone(&logger)));
        let mut replayer = EventReplayer::new(logger, blocklist);

        let err = replayer.process_file(script.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, AppError::CsvError(_)));
    }
}
