//! DropHead（头丢弃）队列
//!
//! 队列已满时先淘汰队首（最老）的 packet，再把新 packet 放到队尾。
//! 对时效性强的流量更合适：宁可丢旧数据也要保留新数据。

use std::collections::VecDeque;

use crate::net::Packet;

use super::PacketQueue;

#[derive(Debug)]
pub struct DropHeadQueue {
    max_packets: usize,
    cur_bytes: u64,
    q: VecDeque<Packet>,
}

impl DropHeadQueue {
    pub fn new(max_packets: usize) -> Self {
        Self {
            max_packets,
            cur_bytes: 0,
            q: VecDeque::new(),
        }
    }
}

impl PacketQueue for DropHeadQueue {
    fn enqueue(&mut self, pkt: Packet) -> Result<Option<Packet>, Packet> {
        // 容量为 0 时没有可淘汰的队首，到达的 packet 本身就是被丢弃的那个
        if self.max_packets == 0 {
            return Err(pkt);
        }
        let evicted = if self.q.len() >= self.max_packets {
            let old = self.q.pop_front();
            if let Some(old) = &old {
                self.cur_bytes = self.cur_bytes.saturating_sub(old.size_bytes() as u64);
            }
            old
        } else {
            None
        };
        self.cur_bytes = self.cur_bytes.saturating_add(pkt.size_bytes() as u64);
        self.q.push_back(pkt);
        Ok(evicted)
    }

    fn dequeue(&mut self) -> Option<Packet> {
        let pkt = self.q.pop_front()?;
        self.cur_bytes = self.cur_bytes.saturating_sub(pkt.size_bytes() as u64);
        Some(pkt)
    }

    fn peek(&self) -> Option<&Packet> {
        self.q.front()
    }

    fn len(&self) -> usize {
        self.q.len()
    }

    fn bytes(&self) -> u64 {
        self.cur_bytes
    }

    fn capacity_packets(&self) -> usize {
        self.max_packets
    }
}
