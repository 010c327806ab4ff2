// Copyright ⓒ 2024-2025 Peter Morgan <peter.james.morgan@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use apache_avro::schema::Schema as AvroSchema;

use crate::{Error, Result};

/// A schema as registered in the schema registry.
///
/// The registry identifies a schema globally by `id`, and by `version`
/// within the subject of a topic key or value. Only the version is sent in a
/// record set.
#[derive(Clone, Debug, PartialEq)]
pub struct SchemaVersionMetadata {
    id: i32,
    version: i32,
    schema: AvroSchema,
}

impl SchemaVersionMetadata {
    pub fn new(id: i32, version: i32, schema: AvroSchema) -> Self {
        Self {
            id,
            version,
            schema,
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn schema(&self) -> &AvroSchema {
        &self.schema
    }

    pub(crate) fn validate(&self, role: &str) -> Result<()> {
        if self.id < 0 {
            Err(Error::InvalidMetadata(format!(
                "{role} schema id: {}",
                self.id
            )))
        } else if self.version < 0 {
            Err(Error::InvalidMetadata(format!(
                "{role} schema version: {}",
                self.version
            )))
        } else {
            Ok(())
        }
    }
}
