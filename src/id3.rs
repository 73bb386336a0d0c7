//! ID3v2 タグのフレームをデコードして、楽曲のメタデータを取り出すためのモジュール
//!
//! 対象のエンコーダーはフレームサイズを synch-safe integer ではなく通常の 32 bit ビッグエンディアンで出力するので、
//! ここでもその形式でサイズを解釈する。
//! また、タグヘッダーのフラグやサイズは参照しない。
use alloc::string::String;

use crate::{
    ByteSpan, Decode, Error, ExtractorOptions, FourCc, Id3Payload, Result,
    text::{clean_text, extract_artwork_url, extract_year},
};

/// ID3v2 フレームのヘッダー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id3FrameHeader {
    /// フレーム識別子
    pub frame_id: FourCc,

    /// ヘッダーを除いたフレーム本体のバイト数
    pub size: u32,

    /// フラグ（解釈はしない）
    pub flags: u16,
}

impl Id3FrameHeader {
    /// ヘッダーのバイト数
    pub const SIZE: usize = 10;

    /// ヘッダーとフレーム本体を合わせたバイト数
    ///
    /// [`usize`] で表現できない場合には [`None`] が返される
    pub fn frame_size(self) -> Option<usize> {
        Self::SIZE.checked_add(usize::try_from(self.size).ok()?)
    }
}

impl Decode for Id3FrameHeader {
    fn decode(buf: &[u8]) -> Result<(Self, usize)> {
        Error::check_buffer_size(Self::SIZE, buf)?;

        let mut offset = 0;
        let frame_id = FourCc::decode_at(buf, &mut offset)?;
        if !frame_id.is_alphanumeric() {
            return Err(Error::invalid_data("Frame ID must be ASCII alphanumeric"));
        }
        let size = u32::decode_at(buf, &mut offset).map_err(|e| e.with_fourcc(frame_id))?;
        let flags = u16::decode_at(buf, &mut offset).map_err(|e| e.with_fourcc(frame_id))?;

        Ok((
            Self {
                frame_id,
                size,
                flags,
            },
            offset,
        ))
    }
}

/// ID3v2 タグ内のフレーム
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id3Frame {
    /// フレームのヘッダー
    pub header: Id3FrameHeader,

    /// 元のバイト列の中でのフレーム本体の範囲
    pub data: ByteSpan,
}

impl Id3Frame {
    /// 曲名
    pub const TITLE: FourCc = FourCc::new(*b"TIT2");

    /// アーティスト名
    pub const ARTIST: FourCc = FourCc::new(*b"TPE1");

    /// アルバム名
    pub const ALBUM: FourCc = FourCc::new(*b"TALB");

    /// 録音日時
    pub const RECORDING_TIME: FourCc = FourCc::new(*b"TDRC");

    /// ユーザー定義 URL（アートワークの URL として使われている）
    pub const USER_URL: FourCc = FourCc::new(*b"WXXX");

    /// フレーム識別子を返す
    pub fn frame_id(&self) -> FourCc {
        self.header.frame_id
    }

    /// フレーム本体のバイト列を返す
    pub fn data<'a>(&self, buf: &'a [u8]) -> Option<&'a [u8]> {
        self.data.slice(buf)
    }
}

/// ID3v2 タグ内のフレームを先頭から順に返すイテレーター
///
/// 以下のいずれかに該当した時点で走査を終了する:
/// - 残りのバイト数がフレームヘッダーのサイズに満たない
/// - フレーム識別子が ASCII の英数字以外を含む（パディングに到達した場合もここに該当する）
/// - フレームのサイズがタグの末尾を越える
#[derive(Debug, Clone)]
pub struct Id3Frames<'a> {
    tag_bytes: &'a [u8],
    tag_offset: usize,
    position: usize,
    finished: bool,
}

impl Id3Frames<'_> {
    fn next_frame(&mut self) -> Result<Option<Id3Frame>> {
        let Some(rest) = self.tag_bytes.get(self.position..) else {
            return Ok(None);
        };
        if rest.len() < Id3FrameHeader::SIZE {
            return Ok(None);
        }

        let (header, header_size) = Id3FrameHeader::decode(rest)?;
        let frame_size = header
            .frame_size()
            .filter(|&n| n <= rest.len())
            .ok_or_else(|| {
                Error::invalid_data(alloc::format!(
                    "Frame size exceeds the tag: size={}, available={}",
                    header.size,
                    rest.len() - header_size
                ))
                .with_fourcc(header.frame_id)
            })?;

        let data = ByteSpan::new(
            self.tag_offset + self.position + header_size,
            frame_size - header_size,
        );
        self.position += frame_size;
        Ok(Some(Id3Frame { header, data }))
    }
}

impl Iterator for Id3Frames<'_> {
    type Item = Id3Frame;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.next_frame() {
            Ok(Some(frame)) => Some(frame),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                log::trace!(
                    "Stopped walking ID3 frames at offset {}: {}",
                    self.tag_offset + self.position,
                    e.reason
                );
                self.finished = true;
                None
            }
        }
    }
}

impl Id3Payload {
    /// タグ内のフレームを走査するイテレーターを返す
    ///
    /// `buf` はこのタグを見つけた時と同じバイト列である必要があり、
    /// 範囲が収まらない場合やタグヘッダー分のサイズがない場合には一つもフレームを返さない
    pub fn frames<'a>(&self, buf: &'a [u8]) -> Id3Frames<'a> {
        let tag_bytes = self
            .bytes(buf)
            .filter(|b| b.len() >= Self::HEADER_SIZE)
            .unwrap_or_default();
        Id3Frames {
            tag_bytes,
            tag_offset: self.span.offset,
            position: Self::HEADER_SIZE,
            finished: tag_bytes.is_empty(),
        }
    }

    /// タグ内の全てのフレームをデコードして、認識できたフィールドを集める
    pub fn decode_fields(&self, buf: &[u8]) -> MetadataFields {
        self.walk(buf).fields
    }

    /// タグをデコードして [`MetadataRecord`] を作成する
    ///
    /// 曲名、アーティスト名、アルバム名のいずれも得られなかった場合には [`None`] が返される
    pub fn decode_metadata(
        &self,
        buf: &[u8],
        options: &ExtractorOptions,
    ) -> Option<MetadataRecord> {
        self.walk(buf).fields.into_record(self.span.offset, options)
    }

    pub(crate) fn walk(&self, buf: &[u8]) -> Id3Walk {
        let mut frames = self.frames(buf);
        let mut fields = MetadataFields::default();
        let mut frame_count = 0;
        for frame in frames.by_ref() {
            frame_count += 1;
            if let Some(data) = frame.data(buf) {
                fields.apply_frame(frame.frame_id(), data);
            }
        }
        Id3Walk {
            fields,
            frame_count,
            end: frames.tag_offset + frames.position,
        }
    }
}

/// [`Id3Payload::walk()`] の結果
#[derive(Debug)]
pub(crate) struct Id3Walk {
    pub fields: MetadataFields,

    /// 受理したフレームの数
    pub frame_count: usize,

    /// 最後に受理したフレームの終端位置（元のバイト列での位置）
    ///
    /// フレームを一つも受理しなかった場合にはタグヘッダーの終端位置になる
    pub end: usize,
}

/// ID3v2 タグから集めたフィールド
///
/// [`MetadataRecord`] とは異なり、曲名などが一つもなくても構わない
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct MetadataFields {
    /// 曲名 (TIT2)
    pub title: Option<String>,

    /// アーティスト名 (TPE1)
    pub artist: Option<String>,

    /// アルバム名 (TALB)
    pub album: Option<String>,

    /// 年 (TDRC の中の四桁の数字)
    pub year: Option<String>,

    /// アートワークの URL (WXXX)
    pub artwork_url: Option<String>,
}

impl MetadataFields {
    /// フレームの内容を対応するフィールドに反映する
    ///
    /// 認識できないフレームは無視する。
    /// 同じフレームが複数ある場合には、空でない最後の値が採用される
    pub fn apply_frame(&mut self, frame_id: FourCc, data: &[u8]) {
        let (field, value) = match frame_id {
            Id3Frame::TITLE => (&mut self.title, clean_text(data)),
            Id3Frame::ARTIST => (&mut self.artist, clean_text(data)),
            Id3Frame::ALBUM => (&mut self.album, clean_text(data)),
            Id3Frame::RECORDING_TIME => (
                &mut self.year,
                clean_text(data).and_then(|s| extract_year(&s)),
            ),
            Id3Frame::USER_URL => (&mut self.artwork_url, extract_artwork_url(data)),
            _ => return,
        };
        if value.is_some() {
            *field = value;
        }
    }

    /// 曲名、アーティスト名、アルバム名のいずれかが存在するかどうか
    pub fn has_primary_field(&self) -> bool {
        self.title.is_some() || self.artist.is_some() || self.album.is_some()
    }

    pub(crate) fn into_record(
        self,
        tag_offset: usize,
        options: &ExtractorOptions,
    ) -> Option<MetadataRecord> {
        if !self.has_primary_field() {
            log::debug!("Ignored ID3 tag at offset {tag_offset} without title, artist or album");
            return None;
        }
        Some(MetadataRecord {
            title: self.title,
            artist: self.artist,
            album: self.album,
            year: self.year,
            artwork_url: self.artwork_url,
            radio_station: options.radio_station.clone(),
            station_owner: options.station_owner.clone(),
        })
    }
}

/// 利用者に通知される楽曲のメタデータ
///
/// `title`, `artist`, `album` の少なくとも一つは必ず [`Some`] となる
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct MetadataRecord {
    /// 曲名
    pub title: Option<String>,

    /// アーティスト名
    pub artist: Option<String>,

    /// アルバム名
    pub album: Option<String>,

    /// 年
    pub year: Option<String>,

    /// アートワークの URL
    pub artwork_url: Option<String>,

    /// 放送局名（ストリームからは取得せず [`ExtractorOptions`] の値をそのまま使う）
    pub radio_station: Option<String>,

    /// 放送局の運営者名（ストリームからは取得せず [`ExtractorOptions`] の値をそのまま使う）
    pub station_owner: Option<String>,
}
