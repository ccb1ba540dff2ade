use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

const SLOT_COUNT: usize = 3;

/// Planar I420 frame as delivered by the call's video pipeline.
#[derive(Debug, Default, Clone)]
pub struct VideoBuffer {
    pub width: u32,
    pub height: u32,
    pub stride_y: u32,
    pub stride_u: u32,
    pub stride_v: u32,
    pub y: Vec<u8>,
    pub u: Vec<u8>,
    pub v: Vec<u8>,
}

/// Borrowed planes of an incoming frame, `(stride, data)` per plane.
#[derive(Debug, Clone, Copy)]
pub struct PlaneRefs<'a> {
    pub y: (u32, &'a [u8]),
    pub u: (u32, &'a [u8]),
    pub v: (u32, &'a [u8]),
}

impl VideoBuffer {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Copies the planes into this buffer, keeping allocations when the
    /// plane sizes did not change. Short source planes are zero-padded.
    pub fn copy_from_planes(&mut self, planes: PlaneRefs<'_>, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.stride_y = planes.y.0;
        self.stride_u = planes.u.0;
        self.stride_v = planes.v.0;

        let chroma_height = height.div_ceil(2);
        copy_plane(&mut self.y, planes.y, height);
        copy_plane(&mut self.u, planes.u, chroma_height);
        copy_plane(&mut self.v, planes.v, chroma_height);
    }

    /// BT.601 limited-range conversion to packed RGBA.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity((self.width * self.height * 4) as usize);
        for row in 0..self.height {
            for col in 0..self.width {
                let y = sample(&self.y, row * self.stride_y + col);
                let chroma = (row / 2) * self.stride_u + col / 2;
                let u = sample(&self.u, chroma);
                let v = sample(&self.v, (row / 2) * self.stride_v + col / 2);

                let c = y - 16;
                let d = u - 128;
                let e = v - 128;
                out.push(clamp_channel((298 * c + 409 * e + 128) >> 8));
                out.push(clamp_channel((298 * c - 100 * d - 208 * e + 128) >> 8));
                out.push(clamp_channel((298 * c + 516 * d + 128) >> 8));
                out.push(255);
            }
        }
        out
    }
}

fn sample(plane: &[u8], index: u32) -> i32 {
    plane.get(index as usize).copied().unwrap_or(0) as i32
}

fn clamp_channel(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

fn copy_plane(dst: &mut Vec<u8>, (stride, src): (u32, &[u8]), rows: u32) {
    let size = (stride * rows) as usize;
    if dst.len() != size {
        dst.resize(size, 0);
    }
    let n = size.min(src.len());
    dst[..n].copy_from_slice(&src[..n]);
    dst[n..].fill(0);
}

/// Triple-buffered frame slots shared between the frame writer and the
/// surface that draws them.
#[derive(Debug)]
pub struct VideoBufferManager {
    buffers: [Mutex<VideoBuffer>; SLOT_COUNT],
    write_index: AtomicUsize,
    read_index: AtomicUsize,
    sequence: AtomicU64,
}

impl Default for VideoBufferManager {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoBufferManager {
    pub fn new() -> Self {
        Self {
            buffers: Default::default(),
            write_index: AtomicUsize::new(0),
            read_index: AtomicUsize::new(0),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn write_buffer(&self) -> &Mutex<VideoBuffer> {
        let write_idx = self.write_index.load(Ordering::Acquire);
        &self.buffers[write_idx]
    }

    /// Publishes the slot just written and moves on to the next one.
    pub fn advance_write(&self) {
        let current = self.write_index.load(Ordering::Acquire);
        self.read_index.store(current, Ordering::Release);
        self.write_index
            .store((current + 1) % SLOT_COUNT, Ordering::Release);
        self.sequence.fetch_add(1, Ordering::AcqRel);
    }

    /// Number of frames published so far; readers use it to skip redundant uploads.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::Acquire)
    }

    /// Most recently published frame.
    pub fn latest_frame(&self) -> &Mutex<VideoBuffer> {
        let read_idx = self.read_index.load(Ordering::Acquire);
        &self.buffers[read_idx]
    }

    /// Dimensions of the latest frame, `None` until something was published.
    pub fn latest_dimensions(&self) -> Option<(u32, u32)> {
        let frame = self.latest_frame().lock();
        if frame.is_empty() {
            None
        } else {
            Some((frame.width, frame.height))
        }
    }
}
