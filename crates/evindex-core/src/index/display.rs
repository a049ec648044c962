use crate::index::EventIndex;
use evindex_primitives::INVALID_ENTRY;
use std::fmt;

impl fmt::Display for EventIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "evindex contents: runs, lumis and events in record-log order"
        )?;
        writeln!(
            f,
            "{:>8}{:>12}{:>12}{:>16}{:>16}",
            "chain", "run", "lumi", "event", "entry"
        )?;

        for record in &self.records {
            if record.is_run() {
                writeln!(
                    f,
                    "{:>8}{:>12}{:>12}{:>16}{:>16}  (run)",
                    record.chain_index(),
                    record.run(),
                    "",
                    "",
                    record.entry()
                )?;
                continue;
            }

            if record.entry() != INVALID_ENTRY {
                writeln!(
                    f,
                    "{:>8}{:>12}{:>12}{:>16}{:>16}  (lumi)",
                    record.chain_index(),
                    record.run(),
                    record.lumi(),
                    "",
                    record.entry()
                )?;
            }
            for slot in self.events.get(record.slots()).unwrap_or_default() {
                writeln!(
                    f,
                    "{:>8}{:>12}{:>12}{:>16}{:>16}",
                    record.chain_index(),
                    record.run(),
                    record.lumi(),
                    slot.event,
                    slot.entry
                )?;
            }
        }

        writeln!(f, "chain ids (the first column above indexes this list)")?;
        for (index, id) in self.chains.iter().enumerate() {
            writeln!(f, "  {index}  {id}")?;
        }

        Ok(())
    }
}
