//! 定长环形缓冲区，写满后覆盖最旧的元素

#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    buf: Vec<Option<T>>,
    read: usize,
    write: usize,
    full: bool,
}

impl<T> RingBuffer<T> {
    /// 容量至少为 1
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        RingBuffer {
            buf: (0..size).map(|_| None).collect(),
            read: 0,
            write: 0,
            full: false,
        }
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let item = self.buf[self.read].take();
        self.read = (self.read + 1) % self.buf.len();
        self.full = false;
        item
    }

    pub fn push_overwrite(&mut self, item: T) {
        self.buf[self.write] = Some(item);
        self.write = (self.write + 1) % self.buf.len();
        if self.full {
            self.read = self.write;
        } else if self.write == self.read {
            self.full = true;
        }
    }

    /// 按写入顺序取出全部元素
    pub fn drain(&mut self) -> Vec<T> {
        let mut items = Vec::with_capacity(self.len());
        while let Some(item) = self.pop() {
            items.push(item);
        }
        items
    }

    pub fn is_empty(&self) -> bool {
        !self.full && self.read == self.write
    }

    pub fn len(&self) -> usize {
        if self.full {
            self.buf.len()
        } else {
            (self.write + self.buf.len() - self.read) % self.buf.len()
        }
    }
}
