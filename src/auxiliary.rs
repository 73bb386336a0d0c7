//! メタデータの抽出処理そのものとは直接は関係がない、利用側で便利な補助的なコンポーネントを集めたモジュール

use alloc::{collections::BTreeSet, vec::Vec};

use crate::{EmsgBox, ExtractorOptions, MetadataExtractor, MetadataRecord, extractor::guard_panic};

/// [`SegmentTrackerOptions::max_buffer_size`] のデフォルト値 (16 MiB)
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 16 * 1024 * 1024;

/// [`SegmentMetadataTracker`] 用のオプション
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SegmentTrackerOptions {
    /// メタデータの抽出に使うオプション
    pub extractor: ExtractorOptions,

    /// 一つのセグメントについて蓄積するバイト数の上限
    ///
    /// これを越えたデータは読み捨てられる
    pub max_buffer_size: usize,
}

impl Default for SegmentTrackerOptions {
    fn default() -> Self {
        Self {
            extractor: ExtractorOptions::default(),
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
        }
    }
}

/// 少しずつ届くメディアセグメントのバイト列を蓄積して、新しく見つかったメタデータだけを返すための構造体
///
/// [`MetadataExtractor`] は状態を持たないので、追記され続けるバッファを渡すたびに同じメタデータを返してしまう。
/// この構造体は、現在のセグメントで既に返した ID3v2 タグの位置を覚えておくことで重複を取り除く。
///
/// また、走査済みの位置と末尾のデータが揃っていないボックスを覚えておき、
/// 追記されたバイト列と新しく揃ったボックスだけを処理する。
///
/// セグメントの区切りは判定できないので、新しいセグメントの受信を開始する際には
/// 利用側で [`SegmentMetadataTracker::start_segment()`] を呼び出す必要がある
#[derive(Debug)]
pub struct SegmentMetadataTracker {
    extractor: MetadataExtractor,
    max_buffer_size: usize,
    buffer: Vec<u8>,

    // 次に `emsg` ボックスのヘッダーを確認する位置
    scan_position: usize,

    // 末尾のデータが揃うのを待っているボックスの (終端位置, 先頭位置)
    pending_boxes: BTreeSet<(usize, usize)>,

    emitted_payload_offsets: BTreeSet<usize>,
    segment_sequence: u64,
    overflowed: bool,
}

impl SegmentMetadataTracker {
    /// [`SegmentMetadataTracker`] インスタンスを生成する
    pub fn new(options: SegmentTrackerOptions) -> Self {
        Self {
            extractor: MetadataExtractor::with_options(options.extractor),
            max_buffer_size: options.max_buffer_size,
            buffer: Vec::new(),
            scan_position: 0,
            pending_boxes: BTreeSet::new(),
            emitted_payload_offsets: BTreeSet::new(),
            segment_sequence: 0,
            overflowed: false,
        }
    }

    /// 新しいセグメントの受信を開始する
    ///
    /// それまでに蓄積したバイト列と、返したメタデータの記録は破棄される
    pub fn start_segment(&mut self) {
        self.buffer.clear();
        self.scan_position = 0;
        self.pending_boxes.clear();
        self.emitted_payload_offsets.clear();
        self.segment_sequence += 1;
        self.overflowed = false;
    }

    /// 現在のセグメントの続きのバイト列を追加し、このセグメントでまだ返していないメタデータを出現順に返す
    pub fn handle_input(&mut self, data: &[u8]) -> Vec<MetadataRecord> {
        let available = self.max_buffer_size.saturating_sub(self.buffer.len());
        if data.len() > available && !self.overflowed {
            log::warn!(
                "Segment #{} exceeds the buffer limit ({} bytes); the rest is ignored",
                self.segment_sequence,
                self.max_buffer_size
            );
            self.overflowed = true;
        }
        let accepted = &data[..data.len().min(available)];
        if accepted.is_empty() {
            return Vec::new();
        }
        self.buffer.extend_from_slice(accepted);

        let completed = self.take_completed_boxes();
        let extractor = &self.extractor;
        let buf = self.buffer.as_slice();
        let extracted = guard_panic(buf.len(), || {
            completed
                .into_iter()
                .filter_map(|b| extractor.extract_from_box(buf, b))
                .collect::<Vec<_>>()
        });

        let mut records = Vec::new();
        for m in extracted {
            if self.emitted_payload_offsets.insert(m.payload.span.offset) {
                log::debug!(
                    "Segment #{}: new metadata at offset {}",
                    self.segment_sequence,
                    m.payload.span.offset
                );
                records.push(m.record);
            }
        }
        records
    }

    /// 前回の呼び出し以降に末尾までのデータが揃ったボックスを、先頭位置の順に返す
    ///
    /// 蓄積しているバイト列は追記しかされないので、一度判定が確定した位置は再び確認しない
    fn take_completed_boxes(&mut self) -> Vec<EmsgBox> {
        let len = self.buffer.len();
        let mut completed = Vec::new();

        while let Some(&(end, offset)) = self.pending_boxes.first() {
            if end > len {
                break;
            }
            self.pending_boxes.pop_first();
            completed.extend(EmsgBox::detect(&self.buffer, offset));
        }

        while self.scan_position.saturating_add(EmsgBox::HEADER_SIZE) <= len {
            let offset = self.scan_position;
            self.scan_position += 1;

            let Some(declared_size) = EmsgBox::declared_size_at(&self.buffer, offset) else {
                continue;
            };
            match offset.checked_add(declared_size as usize) {
                // バッファの上限を越えるボックスは揃うことがないので待たない
                Some(end) if declared_size > 0 && len < end && end <= self.max_buffer_size => {
                    self.pending_boxes.insert((end, offset));
                }
                _ => completed.extend(EmsgBox::detect(&self.buffer, offset)),
            }
        }

        completed.sort_unstable_by_key(|b| b.span.offset);
        completed
    }

    /// 現在のセグメントについて蓄積しているバイト数を返す
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// 現在のセグメントの通し番号を返す
    ///
    /// 最初のセグメントは 0 で、[`SegmentMetadataTracker::start_segment()`] を呼ぶたびに 1 ずつ増える
    pub fn segment_sequence(&self) -> u64 {
        self.segment_sequence
    }

    /// 現在のセグメントで返したメタデータの数を返す
    pub fn emitted_count(&self) -> usize {
        self.emitted_payload_offsets.len()
    }
}

impl Default for SegmentMetadataTracker {
    fn default() -> Self {
        Self::new(SegmentTrackerOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{emsg_box, id3_frame, id3_tag};

    fn emsg_with_title(title: &str) -> Vec<u8> {
        emsg_box(&id3_tag(&[id3_frame(b"TIT2", title.as_bytes())]))
    }

    #[test]
    fn emit_once_per_segment() {
        let data = emsg_with_title("Song");
        let (head, tail) = data.split_at(20);

        let mut tracker = SegmentMetadataTracker::default();
        assert!(tracker.handle_input(b"junk").is_empty());
        assert!(tracker.handle_input(head).is_empty());

        let records = tracker.handle_input(tail);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title.as_deref(), Some("Song"));

        // 同じセグメントに追記しても、既に返したメタデータは返されない
        assert!(tracker.handle_input(&[0; 8]).is_empty());
        assert_eq!(tracker.emitted_count(), 1);

        let records = tracker.handle_input(&emsg_with_title("Next"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title.as_deref(), Some("Next"));
    }

    #[test]
    fn start_new_segment() {
        let data = emsg_with_title("Song");
        let mut tracker = SegmentMetadataTracker::default();
        assert_eq!(tracker.handle_input(&data).len(), 1);

        tracker.start_segment();
        assert_eq!(tracker.segment_sequence(), 1);
        assert_eq!(tracker.buffered_len(), 0);
        assert_eq!(tracker.emitted_count(), 0);
        assert_eq!(tracker.handle_input(&data).len(), 1);
    }

    #[test]
    fn buffer_limit() {
        let data = emsg_with_title("Song");
        let mut tracker = SegmentMetadataTracker::new(SegmentTrackerOptions {
            max_buffer_size: data.len() - 1,
            ..Default::default()
        });
        assert!(tracker.handle_input(&data).is_empty());
        assert_eq!(tracker.buffered_len(), data.len() - 1);
        assert!(tracker.handle_input(&data).is_empty());
        assert_eq!(tracker.buffered_len(), data.len() - 1);

        // 上限を越えるボックスは待たない
        assert!(tracker.pending_boxes.is_empty());
    }

    #[test]
    fn scan_resumes_after_checked_positions() {
        let data = emsg_with_title("Song");
        let mut tracker = SegmentMetadataTracker::default();

        assert!(tracker.handle_input(&[0xAA; 100]).is_empty());
        assert_eq!(tracker.scan_position, 100 - EmsgBox::HEADER_SIZE + 1);

        // ヘッダーだけが届いたボックスは、末尾が揃うまで保留される
        assert!(tracker.handle_input(&data[..12]).is_empty());
        assert_eq!(
            tracker.pending_boxes.iter().copied().collect::<Vec<_>>(),
            [(100 + data.len(), 100)]
        );

        let records = tracker.handle_input(&data[12..]);
        assert_eq!(records.len(), 1);
        assert!(tracker.pending_boxes.is_empty());
        assert_eq!(tracker.scan_position, tracker.buffered_len() - EmsgBox::HEADER_SIZE + 1);
    }

    #[test]
    fn completed_boxes_are_returned_in_offset_order() {
        // 外側のボックスの中に内側のボックスが丸ごと含まれているので、両方が同時に揃う
        let inner = emsg_with_title("Inner");
        let mut message_data = id3_tag(&[id3_frame(b"TIT2", b"Outer")]);
        message_data.extend_from_slice(&inner);
        let data = emsg_box(&message_data);

        let mut tracker = SegmentMetadataTracker::default();
        let (head, tail) = data.split_at(data.len() - 1);
        assert!(tracker.handle_input(head).is_empty());
        let titles: Vec<_> = tracker
            .handle_input(tail)
            .into_iter()
            .filter_map(|r| r.title)
            .collect();
        assert_eq!(titles, ["Outer", "Inner"]);
    }

    #[cfg(feature = "std")]
    #[test]
    fn panic_drops_only_the_current_input() {
        let mut tracker = SegmentMetadataTracker::default();
        let records =
            crate::test_support::with_panic(|| tracker.handle_input(&emsg_with_title("Lost")));
        assert!(records.is_empty());

        let records = tracker.handle_input(&emsg_with_title("Next"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title.as_deref(), Some("Next"));
    }
}
