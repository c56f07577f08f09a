//! 仿真器
//!
//! 定义事件驱动仿真器，维护当前时间与事件队列。

use super::event::Event;
use super::scheduled_event::{EventId, ScheduledEvent};
use super::time::SimTime;
use super::world::World;
use std::collections::{BinaryHeap, HashSet};
use tracing::{debug, info, trace};

/// 事件驱动仿真器：维护当前时间与事件队列。
///
/// 同一时刻的事件按调度顺序（FIFO）执行。
#[derive(Default)]
pub struct Simulator {
    now: SimTime,
    next_seq: u64,
    q: BinaryHeap<ScheduledEvent>,
    cancelled: HashSet<u64>,
    stopped: bool,
}

impl Simulator {
    /// 获取当前仿真时间
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// 调度事件在指定时间执行
    #[tracing::instrument(skip(self, ev), fields(event_type = std::any::type_name::<E>(), schedule_at = ?at))]
    pub fn schedule<E: Event>(&mut self, at: SimTime, ev: E) -> EventId {
        let seq = self.next_seq;
        trace!(now = ?self.now, seq, "调度事件");

        self.next_seq = self.next_seq.wrapping_add(1);
        self.q.push(ScheduledEvent {
            at: at.max(self.now),
            seq,
            ev: Box::new(ev),
        });

        debug!(queue_size = self.q.len(), "事件已加入队列");
        EventId(seq)
    }

    /// 调度事件在 `now + delay` 执行
    pub fn schedule_in<E: Event>(&mut self, delay: SimTime, ev: E) -> EventId {
        let at = SimTime(self.now.0.saturating_add(delay.0));
        self.schedule(at, ev)
    }

    /// 取消尚未执行的事件；对已执行的事件无效果。
    pub fn cancel(&mut self, id: EventId) {
        if self.q.iter().any(|item| item.seq == id.0) {
            trace!(seq = id.0, "取消事件");
            self.cancelled.insert(id.0);
        }
    }

    /// 当前事件执行完后停止运行。
    pub fn stop(&mut self) {
        info!(now = ?self.now, "⏹️  请求停止仿真");
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// 队列中尚未执行（且未被取消）的事件数
    pub fn pending(&self) -> usize {
        self.q.len().saturating_sub(self.cancelled.len())
    }

    /// 运行直到事件队列为空、调用了 `stop()` 或到达 `until`。
    pub fn run_until(&mut self, until: SimTime, world: &mut dyn World) {
        self.stopped = false;
        while let Some(top) = self.q.peek() {
            if top.at > until {
                break;
            }
            let Some(item) = self.q.pop() else { break };
            if self.cancelled.remove(&item.seq) {
                continue;
            }
            self.now = item.at;
            item.ev.execute(self, world);
            world.on_tick(self);
            if self.stopped {
                return;
            }
        }
        self.now = self.now.max(until);
    }

    /// 运行所有事件直到队列为空或调用了 `stop()`。
    #[tracing::instrument(skip(self, world))]
    pub fn run(&mut self, world: &mut dyn World) {
        info!("▶️  开始运行仿真");
        debug!(now = ?self.now, queue_size = self.q.len(), "初始状态");

        self.stopped = false;
        let mut event_count = 0;
        while let Some(item) = self.q.pop() {
            if self.cancelled.remove(&item.seq) {
                continue;
            }
            event_count += 1;
            self.now = item.at;

            debug!(
                event_num = event_count,
                now = ?self.now,
                seq = item.seq,
                remaining_queue = self.q.len(),
                "执行事件"
            );

            item.ev.execute(self, world);
            world.on_tick(self);
            if self.stopped {
                break;
            }
        }

        info!(
            total_events = event_count,
            final_time = ?self.now,
            "✅ 仿真完成"
        );
    }
}
