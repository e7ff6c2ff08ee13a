// Concurrent re-reading of partitioned sources.
//
// A partition plan is made for byte-offset seekers; this is the fan-out
// side. Every segment is re-read through its own file handle and scanned
// as an independent source, so workers never share state and the combined
// output matches a sequential scan of the same bytes.
//
// Each call brings its own pool sized to its plan. The plan already says
// how many independent reads exist; threads past one per segment, or past
// what the host offers, would only contend on the same disk.

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use rayon::prelude::*;
use tracing::debug;

use crate::assume_no_header;
use crate::partition::Segment;
use crate::scanner::Scanner;

/// Worker count for one re-read: one thread per segment, bounded by the
/// host's parallelism.
fn worker_count(segment_count: usize) -> usize {
    let host = std::thread::available_parallelism().map_or(1, |p| p.get());
    segment_count.clamp(1, host)
}

/// Re-read every segment of the file at `path` concurrently, scanning each
/// as an independent source. Results keep segment order; each entry is the
/// segment's normalized records.
///
/// A segment's trailing terminator implies an empty record when its bytes
/// are scanned alone; those implied records are dropped so each entry
/// holds exactly the segment's non-empty records.
pub fn scan_segments_parallel(
    path: &Path,
    segments: &[Segment],
) -> io::Result<Vec<Vec<Vec<String>>>> {
    if segments.is_empty() {
        return Ok(Vec::new());
    }
    debug!(
        segments = segments.len(),
        path = %path.display(),
        "re-reading segments in parallel"
    );

    let read_all = || {
        segments
            .par_iter()
            .map(|segment| scan_segment(path, segment))
            .collect()
    };
    match rayon::ThreadPoolBuilder::new()
        .num_threads(worker_count(segments.len()))
        .build()
    {
        Ok(pool) => pool.install(read_all),
        // If the host refuses another pool, the work still runs on
        // whatever rayon already has.
        Err(_) => read_all(),
    }
}

/// Read one segment's byte range and scan it alone.
fn scan_segment(path: &Path, segment: &Segment) -> io::Result<Vec<Vec<String>>> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(segment.lower_offset))?;
    let mut bytes = vec![0u8; segment.length as usize];
    file.read_exact(&mut bytes)?;

    let mut scanner = Scanner::new(Some(Cursor::new(bytes)), assume_no_header);
    let mut records = Vec::new();
    while scanner.advance() {
        if scanner.emission_payload_len() > 0 {
            records.push(scanner.current().to_vec());
        }
    }
    Ok(records)
}
