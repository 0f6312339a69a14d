//! # Cache 模块
//!
//! 带 LRU 驱逐的有界键值缓存。
//!
//! ## 设计说明
//!
//! - 条目存放在连续的 `Vec` 中，通过 `prev`/`next` 下标组成双向链表
//! - 链表头部是最近使用的条目，尾部是最久未使用的条目
//! - `HashMap` 记录 key 到下标的映射，查找与提升均为 O(1)
//! - 删除使用 `swap_remove`，被移动的末尾节点会修正邻居与映射
//! - `insert` 不检查容量：驱逐与插入解耦，由 `evict_excess` 每帧统一执行
//!
//! 不变式：map 中的每个 key 在链表中恰好出现一次，反之亦然。

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use tracing::warn;

/// 空链接
const NIL: usize = usize::MAX;

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    prev: usize,
    next: usize,
}

/// LRU 缓存
///
/// 对三类资源（背景、立绘、音乐）分别实例化，容量独立计算。
#[derive(Debug)]
pub struct LruCache<K, V> {
    /// key -> 节点下标
    map: HashMap<K, usize>,
    /// 节点存储
    nodes: Vec<Node<K, V>>,
    /// 最近使用的节点
    head: usize,
    /// 最久未使用的节点
    tail: usize,
    /// 容量上限（条目数）
    capacity: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// 创建指定容量的缓存
    pub fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::new(),
            nodes: Vec::new(),
            head: NIL,
            tail: NIL,
            capacity,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// 查找条目，命中时提升到链表头部
    pub fn lookup<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.map.get(key).copied() {
            Some(idx) => {
                self.hits += 1;
                self.promote(idx);
                Some(&self.nodes[idx].value)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// 只读查找（不更新 LRU 顺序，不计入统计）
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.get(key).map(|&idx| &self.nodes[idx].value)
    }

    /// 检查是否存在
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    /// 插入条目到链表头部
    ///
    /// 如果 key 已存在，替换其值并返回旧值，由调用方负责释放。
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(&idx) = self.map.get(&key) {
            self.promote(idx);
            return Some(std::mem::replace(&mut self.nodes[idx].value, value));
        }

        let idx = self.nodes.len();
        self.nodes.push(Node {
            key: key.clone(),
            value,
            prev: NIL,
            next: NIL,
        });
        self.map.insert(key, idx);
        self.push_front(idx);
        None
    }

    /// 移除指定条目
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.map.get(key).copied()?;
        let (_, value) = self.remove_at(idx);
        Some(value)
    }

    /// 驱逐超出容量的条目
    ///
    /// 从链表尾部开始，跳过 `is_pinned` 返回 true 的条目，
    /// 直到条目数不超过容量。返回被驱逐的条目，调用方负责释放底层资源。
    pub fn evict_excess(&mut self, mut is_pinned: impl FnMut(&K) -> bool) -> Vec<(K, V)> {
        let mut evicted = Vec::new();
        let mut cursor = self.tail;

        while self.map.len() > self.capacity && cursor != NIL {
            let prev = self.nodes[cursor].prev;
            if is_pinned(&self.nodes[cursor].key) {
                cursor = prev;
                continue;
            }

            // swap_remove 会把末尾节点移动到 cursor
            let last = self.nodes.len() - 1;
            evicted.push(self.remove_at(cursor));
            self.evictions += 1;
            cursor = if prev == last { cursor } else { prev };
        }

        if self.map.len() > self.capacity {
            warn!(
                entries = self.map.len(),
                capacity = self.capacity,
                "缓存超出容量，但剩余条目均被当前状态引用"
            );
        }

        evicted
    }

    /// 按最近使用顺序取出所有条目并清空缓存
    pub fn drain(&mut self) -> Vec<(K, V)> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut cursor = self.head;
        while cursor != NIL {
            order.push(cursor);
            cursor = self.nodes[cursor].next;
        }

        let mut slots: Vec<Option<Node<K, V>>> = self.nodes.drain(..).map(Some).collect();
        self.map.clear();
        self.head = NIL;
        self.tail = NIL;

        order
            .into_iter()
            .filter_map(|idx| slots[idx].take())
            .map(|node| (node.key, node.value))
            .collect()
    }

    /// 按最近使用顺序返回所有 key（头部在前）
    pub fn keys_by_recency(&self) -> Vec<&K> {
        self.iter().map(|(k, _)| k).collect()
    }

    /// 按最近使用顺序迭代
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            cache: self,
            cursor: self.head,
        }
    }

    /// 条目数量
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// 容量上限
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 调整容量（下一次 `evict_excess` 生效）
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }

    /// 获取统计信息
    pub fn stats(&self) -> CacheStats {
        let lookups = self.hits + self.misses;
        CacheStats {
            entries: self.map.len(),
            capacity: self.capacity,
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            hit_rate: if lookups > 0 {
                self.hits as f64 / lookups as f64
            } else {
                0.0
            },
        }
    }

    // === 内部方法 ===

    fn promote(&mut self, idx: usize) {
        if self.head != idx {
            self.unlink(idx);
            self.push_front(idx);
        }
    }

    fn push_front(&mut self, idx: usize) {
        self.nodes[idx].prev = NIL;
        self.nodes[idx].next = self.head;
        if self.head != NIL {
            self.nodes[self.head].prev = idx;
        } else {
            self.tail = idx;
        }
        self.head = idx;
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        if prev != NIL {
            self.nodes[prev].next = next;
        } else {
            self.head = next;
        }
        if next != NIL {
            self.nodes[next].prev = prev;
        } else {
            self.tail = prev;
        }
        self.nodes[idx].prev = NIL;
        self.nodes[idx].next = NIL;
    }

    fn remove_at(&mut self, idx: usize) -> (K, V) {
        self.unlink(idx);

        let last = self.nodes.len() - 1;
        if idx != last {
            let (prev, next) = (self.nodes[last].prev, self.nodes[last].next);
            if prev != NIL {
                self.nodes[prev].next = idx;
            } else {
                self.head = idx;
            }
            if next != NIL {
                self.nodes[next].prev = idx;
            } else {
                self.tail = idx;
            }
        }

        let node = self.nodes.swap_remove(idx);
        if idx != last
            && let Some(slot) = self.map.get_mut(&self.nodes[idx].key)
        {
            *slot = idx;
        }
        self.map.remove(&node.key);
        (node.key, node.value)
    }
}

/// 按最近使用顺序的迭代器
pub struct Iter<'a, K, V> {
    cache: &'a LruCache<K, V>,
    cursor: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let node = &self.cache.nodes[self.cursor];
        self.cursor = node.next;
        Some((&node.key, &node.value))
    }
}

/// 缓存统计信息
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    /// 缓存条目数量
    pub entries: usize,
    /// 容量上限
    pub capacity: usize,
    /// 命中次数
    pub hits: u64,
    /// 未命中次数
    pub misses: u64,
    /// 驱逐次数
    pub evictions: u64,
    /// 命中率
    pub hit_rate: f64,
}

impl CacheStats {
    /// 格式化为可读字符串
    pub fn format(&self) -> String {
        format!(
            "Cache: {}/{} entries, hit rate: {:.1}%, evictions: {}",
            self.entries,
            self.capacity,
            self.hit_rate * 100.0,
            self.evictions,
        )
    }
}
