//! The upstream pose estimator, abstracted to a per-frame call. The
//! shipped implementation replays a recorded stream (JSON Lines, one
//! frame per line); a live estimator would sit behind the same trait.

use crate::{
    error::Error,
    pose::{Frame, WireFrame},
};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

pub(crate) trait PoseSource {
    /// Fetch the next frame. `Ok(None)` is a clean end of stream.
    fn next_pose(&mut self) -> Result<Option<Frame>, Error>;
}

pub(crate) struct JsonlSource<R> {
    reader: R,
    line: String,
    line_num: usize,
    scale: f32,
}

impl JsonlSource<BufReader<File>> {
    /// Open a recorded stream. `scale` is multiplied into every
    /// coordinate on ingest; the assessment thresholds assume
    /// display-resolution pixels at a fixed camera framing, so
    /// streams recorded at another scale must be normalized here.
    pub(crate) fn open<P>(path: P, scale: f32) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file =
            File::open(path).map_err(|e| Error::OpenSource(e, path.to_path_buf()))?;
        Ok(Self::from_reader(BufReader::new(file), scale))
    }
}

impl<R> JsonlSource<R>
where
    R: BufRead,
{
    pub(crate) fn from_reader(reader: R, scale: f32) -> Self {
        Self {
            reader,
            line: String::new(),
            line_num: 0,
            scale,
        }
    }
}

impl<R> PoseSource for JsonlSource<R>
where
    R: BufRead,
{
    fn next_pose(&mut self) -> Result<Option<Frame>, Error> {
        loop {
            self.line.clear();
            let read = self
                .reader
                .read_line(&mut self.line)
                .map_err(|e| Error::ReadFrame(e, self.line_num))?;
            if read == 0 {
                return Ok(None);
            }
            self.line_num += 1;

            let trimmed = self.line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let wire: WireFrame =
                serde_json::from_str(trimmed).map_err(|e| Error::ParseFrame(e, self.line_num))?;
            return Frame::from_wire(&wire, self.scale).map(Some);
        }
    }
}
