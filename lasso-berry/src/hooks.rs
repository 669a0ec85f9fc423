//! 查看器事件的观察者注册.
//!
//! 宿主查看器在每帧渲染完成、切片变更时调用 [`ViewerHooks`], 后者依次通知所有仍存活的订阅者.
//! 订阅者以弱引用持有, 查看器不延长它们的生命周期.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Instant;

use crate::draw::DrawingSurface;
use crate::transform::CoordinateTransform;
use crate::ImagePoint;

/// 查看器事件的订阅者. 两个方法默认什么都不做.
pub trait ViewerObserver {
    /// 一帧渲染完成.
    fn on_frame_rendered(&mut self, _viewer: &dyn CoordinateTransform, _surface: &mut dyn DrawingSurface) {}

    /// 切片变更. `cursor` 为当前光标的图像索引, `now` 为事件时刻.
    fn on_slice_changed(&mut self, _viewer: &dyn CoordinateTransform, _cursor: ImagePoint, _now: Instant) {}
}

/// 订阅者列表.
#[derive(Default)]
pub struct ViewerHooks {
    observers: Vec<Weak<RefCell<dyn ViewerObserver>>>,
}

impl ViewerHooks {
    /// 空列表.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 订阅. 同一个订阅者重复订阅会被通知多次.
    pub fn subscribe<O: ViewerObserver + 'static>(&mut self, observer: &Rc<RefCell<O>>) {
        let observer: Rc<RefCell<dyn ViewerObserver>> = observer.clone();
        self.observers.push(Rc::downgrade(&observer));
    }

    /// 仍存活的订阅者个数.
    pub fn len(&self) -> usize {
        self.observers.iter().filter(|w| w.strong_count() > 0).count()
    }

    /// 是否没有存活的订阅者?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 通知 "一帧渲染完成".
    pub fn frame_rendered(&mut self, viewer: &dyn CoordinateTransform, surface: &mut dyn DrawingSurface) {
        self.notify(|o| o.on_frame_rendered(viewer, surface));
    }

    /// 通知 "切片变更".
    pub fn slice_changed(&mut self, viewer: &dyn CoordinateTransform, cursor: ImagePoint, now: Instant) {
        self.notify(|o| o.on_slice_changed(viewer, cursor, now));
    }

    /// 依次通知存活的订阅者, 并移除已释放的. 正被借用 (重入) 的订阅者本轮跳过.
    fn notify<F: FnMut(&mut dyn ViewerObserver)>(&mut self, mut f: F) {
        self.observers.retain(|weak| {
            let Some(rc) = weak.upgrade() else {
                return false;
            };
            match rc.try_borrow_mut() {
                Ok(mut observer) => f(&mut *observer),
                Err(_) => log::warn!("Observer is busy, skipping notification"),
            }
            true
        });
    }
}
