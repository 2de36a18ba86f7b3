use crate::error::Result;
use crate::models::{Frame, SiteLabel};
use crate::utils::constants::{
    COL_DATETIME, COL_SITE, COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY,
    COMPRESSION_ZSTD, DEFAULT_ROW_GROUP_SIZE,
};
use crate::writers::RecordSink;
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray, TimestampMillisecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
    batch_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
            batch_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(parquet::basic::ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(crate::error::ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Arrow schema for a table: integer or text site labels, a
    /// millisecond timestamp, then one nullable float column per field.
    pub fn create_schema(&self, frame: &Frame) -> Arc<Schema> {
        let site_type = if integer_sites(frame).is_some() {
            DataType::Int64
        } else {
            DataType::Utf8
        };

        let mut fields = vec![
            Field::new(COL_SITE, site_type, false),
            Field::new(
                COL_DATETIME,
                DataType::Timestamp(TimeUnit::Millisecond, None),
                false,
            ),
        ];
        fields.extend(
            frame
                .columns()
                .iter()
                .map(|c| Field::new(c.name.as_str(), DataType::Float64, true)),
        );

        Arc::new(Schema::new(fields))
    }

    /// Convert a table to one Arrow RecordBatch
    pub fn frame_to_batch(&self, frame: &Frame, schema: Arc<Schema>) -> Result<RecordBatch> {
        let site_array: ArrayRef = match integer_sites(frame) {
            Some(ids) => Arc::new(Int64Array::from(ids)),
            None => Arc::new(StringArray::from(
                frame.sites().iter().map(|s| s.to_string()).collect::<Vec<_>>(),
            )),
        };

        let millis: Vec<i64> = frame
            .datetimes()
            .iter()
            .map(|dt| dt.and_utc().timestamp_millis())
            .collect();

        let mut arrays: Vec<ArrayRef> = vec![site_array, Arc::new(TimestampMillisecondArray::from(millis))];
        arrays.extend(
            frame
                .columns()
                .iter()
                .map(|c| Arc::new(Float64Array::from(c.values.clone())) as ArrayRef),
        );

        Ok(RecordBatch::try_new(schema, arrays)?)
    }

    /// Write a table in row batches; a zero-row table still gets its schema.
    pub fn write_frame(&self, frame: &Frame, path: &Path) -> Result<()> {
        let schema = self.create_schema(frame);
        let batch = self.frame_to_batch(frame, schema.clone())?;

        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;

        let mut offset = 0;
        while offset < batch.num_rows() {
            let len = self.batch_size.min(batch.num_rows() - offset);
            writer.write(&batch.slice(offset, len))?;
            offset += len;
        }

        writer.close()?;
        Ok(())
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let file_metadata = metadata.file_metadata();
        let row_groups = metadata.num_row_groups();
        let total_rows = file_metadata.num_rows();
        let columns = file_metadata.schema_descr().num_columns();
        let file_size = std::fs::metadata(path)?.len();

        let mut row_group_sizes = Vec::new();
        for i in 0..row_groups {
            let rg_metadata = metadata.row_group(i);
            row_group_sizes.push(rg_metadata.num_rows());
        }

        // The codec actually stored, which may differ from this writer's.
        let compression = if row_groups > 0 && metadata.row_group(0).num_columns() > 0 {
            metadata.row_group(0).column(0).compression()
        } else {
            self.compression
        };

        Ok(ParquetFileInfo {
            total_rows,
            columns,
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size,
            compression,
        })
    }
}

fn integer_sites(frame: &Frame) -> Option<Vec<i64>> {
    frame.sites().iter().map(SiteLabel::as_int).collect()
}

impl RecordSink for ParquetWriter {
    fn write(&self, frame: &Frame, path: &Path) -> Result<()> {
        self.write_frame(frame, path)
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub columns: usize,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        let avg_rows = if self.row_groups > 0 {
            self.total_rows as f64 / self.row_groups as f64
        } else {
            0.0
        };

        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Columns: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} MB\n\
            - Compression: {:?}\n\
            - Avg rows per group: {:.0}",
            self.total_rows,
            self.columns,
            self.row_groups,
            self.file_size as f64 / 1_048_576.0, // Convert to MB
            self.compression,
            avg_rows
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::timestamp::from_components;
    use crate::models::Column;
    use tempfile::NamedTempFile;

    fn sample(labels: Vec<SiteLabel>) -> Frame {
        let n = labels.len();
        Frame::new(
            labels,
            (0..n)
                .map(|h| from_components(2024.0, 1.0, 1.0, h as f64).unwrap())
                .collect(),
            vec![Column::new("blh_forecast", (0..n).map(|h| Some(h as f64)).collect())],
        )
        .unwrap()
    }

    #[test]
    fn test_schema_follows_site_type() {
        let writer = ParquetWriter::new();

        let ints = writer.create_schema(&sample(vec![SiteLabel::Int(1)]));
        assert_eq!(ints.field(0).data_type(), &DataType::Int64);

        let text = writer.create_schema(&sample(vec![SiteLabel::text("site_1")]));
        assert_eq!(text.field(0).data_type(), &DataType::Utf8);
        assert_eq!(text.fields().len(), 3);
    }

    #[test]
    fn test_write_empty_frame() -> Result<()> {
        let writer = ParquetWriter::new();
        let temp_file = NamedTempFile::new()?;

        writer.write(&Frame::empty(&["era5_blh", "blh_forecast"]), temp_file.path())?;

        let info = writer.get_file_info(temp_file.path())?;
        assert_eq!(info.total_rows, 0);
        assert_eq!(info.columns, 4);
        Ok(())
    }

    #[test]
    fn test_file_info_reports_stored_codec() -> Result<()> {
        let temp_file = NamedTempFile::new()?;
        ParquetWriter::new()
            .with_compression("zstd")?
            .write(&sample(vec![SiteLabel::Int(1); 3]), temp_file.path())?;

        let info = ParquetWriter::new().get_file_info(temp_file.path())?;
        assert!(matches!(info.compression, Compression::ZSTD(_)));
        assert_eq!(info.row_group_sizes, vec![3]);
        Ok(())
    }

    #[test]
    fn test_write_in_batches() -> Result<()> {
        let writer = ParquetWriter::new().with_batch_size(2);
        let temp_file = NamedTempFile::new()?;

        writer.write(&sample(vec![SiteLabel::Int(1); 5]), temp_file.path())?;

        let info = writer.get_file_info(temp_file.path())?;
        assert_eq!(info.total_rows, 5);
        Ok(())
    }

    #[test]
    fn test_different_compressions() -> Result<()> {
        let compressions = [
            COMPRESSION_SNAPPY,
            COMPRESSION_GZIP,
            COMPRESSION_LZ4,
            COMPRESSION_ZSTD,
            COMPRESSION_NONE,
        ];

        for compression in &compressions {
            let writer = ParquetWriter::new().with_compression(compression)?;
            let temp_file = NamedTempFile::new()?;

            let result = writer.write(&sample(vec![SiteLabel::Int(1)]), temp_file.path());
            assert!(result.is_ok(), "Failed with compression: {}", compression);
        }

        assert!(ParquetWriter::new().with_compression("brotli9").is_err());
        assert!(ParquetWriter::new().with_compression("ZSTD").is_ok());
        Ok(())
    }
}
