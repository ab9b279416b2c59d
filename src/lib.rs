pub mod config;
pub mod engine;
pub mod error;
pub mod hashing;
pub mod index;
pub mod keys;
pub mod query;
pub mod search;
pub mod store;

pub use config::{IndexConfig, TokenizerConfig};
pub use engine::SearchEngine;
pub use error::{Error, ErrorKind, Result};
pub use index::PositionalIndex;
pub use search::CancellationToken;

/*
┌────────────────────────────────────────────────────────────────────────────────────────────┐
│                               LEXIDEX STRUCT ARCHITECTURE                                    │
└────────────────────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────────── FACADE LAYER ────────────────────────────────────────────┐
│                                                                                               │
│  ┌────────────────────────────────────────────────────────────────────────────────────┐    │
│  │                           struct SearchEngine<R>                                     │    │
│  │  ┌──────────────────────────────────────────────────────────────────────────────┐ │    │
│  │  │ index: PositionalIndex<R>         // Durable positional store               │ │    │
│  │  │ tokenizer: Box<dyn Tokenizer>     // Text → Slice sequence                  │ │    │
│  │  │ hasher: Box<dyn HashGenerator>    // Slice → u64 token                      │ │    │
│  │  └──────────────────────────────────────────────────────────────────────────────┘ │    │
│  └────────────────────────────────────────────────────────────────────────────────────┘    │
│         add_record / update_record / delete_tokens / delete_record                         │
│         add_facet / delete_facet / simple_search / search / search_query                   │
└───────────────────────────────────────────────────────────────────────────────────────────────┘

┌─────────────────────────────────────── INDEX LAYER ──────────────────────────────────────────┐
│                                                                                               │
│  ┌────────────────────────────────────────────────────────────────────────────────────┐    │
│  │                         struct PositionalIndex<R>                                    │    │
│  │  ┌──────────────────────────────────────────────────────────────────────────────┐ │    │
│  │  │ primary: Arc<dyn OrderedStore>     // (token, record, prev_token) triples    │ │    │
│  │  │ secondary: Option<Arc<dyn OrderedStore>> // (record, token) mirror           │ │    │
│  │  │ dropped: AtomicBool                // terminal lifecycle latch              │ │    │
│  │  └──────────────────────────────────────────────────────────────────────────────┘ │    │
│  └────────────────────────────────────────────────────────────────────────────────────┘    │
│  upsert / delete / delete_record (full-scan or secondary-assisted)                          │
│  simple_search ──delegates──> search::simple   search ──delegates──> search::advanced       │
└───────────────────────────────────────────────────────────────────────────────────────────────┘

┌─────────────────────────────────────── SEARCH LAYER ──────────────────────────────────────────┐
│                                                                                               │
│  ┌─────────────────────────┐   ┌──────────────────────────┐   ┌───────────────────────┐    │
│  │ fn simple_search()      │   │ fn search() (advanced)   │   │ struct CancellationTok│    │
│  │ • ContainsAll(probe)    │   │ • FindProbeTokens(ast)   │   │ • checked between     │    │
│  │ • ContainsAny(facets)   │   │ • Matches(ast, record)   │   │   enumeration steps   │    │
│  │ • skip/limit pagination │   │ • full-scan fallback     │   └───────────────────────┘    │
│  └─────────────────────────┘   └──────────────────────────┘                                 │
│  Both open two independent ordered iterators per call: one to enumerate a probe              │
│  token's postings, one to re-seek and verify candidate records.                             │
└───────────────────────────────────────────────────────────────────────────────────────────────┘

┌─────────────────────────────────────── QUERY LAYER ──────────────────────────────────────────┐
│                                                                                               │
│  ┌──────────────────┐  ┌──────────────────────┐  ┌──────────────┐  ┌────────────────────┐  │
│  │ fn lex()          │  │ struct Parser<'a>    │  │ fn lower_query│  │ struct QueryNode<T>│  │
│  │ • LexToken stream │  │ • precedence climb   │  │ • tokenizes   │  │ • kind: Query-     │  │
│  │ • phrase escapes  │  │ • AND=2 > OR=1       │  │   string leaves│  │   Kind (And/Or/Not)│  │
│  │ • & | - aliases   │  │ • tolerant recovery  │  │ • reshapes tree│  │ • tokens / children│  │
│  └──────────────────┘  └──────────────────────┘  └──────────────┘  │ • respect_order    │  │
│                                                                      │ • is_facet         │  │
│                                                                      └────────────────────┘  │
└───────────────────────────────────────────────────────────────────────────────────────────────┘

┌─────────────────────────────────────── STORE LAYER ───────────────────────────────────────────┐
│                                                                                               │
│  ┌────────────────────────────────────────────────────────────────────────────────────┐    │
│  │                              struct LsmStore                                         │    │
│  │  ┌──────────────────────────────────────────────────────────────────────────────┐ │    │
│  │  │ layout: StoreLayout                // on-disk directory conventions          │ │    │
│  │  │ memtable: Memtable                 // BTreeMap<Vec<u8>, u8>, RwLock-guarded  │ │    │
│  │  │ wal: Mutex<Wal>                    // durability before memtable insert      │ │    │
│  │  │ segments: RwLock<Vec<SegmentMeta>> // immutable sorted on-disk runs          │ │    │
│  │  │ cache: BlockCache                  // time-boxed LRU of decoded segments     │ │    │
│  │  │ merge_policy: Box<dyn MergePolicy> // tiered / log-structured compaction     │ │    │
│  │  │ maintainer: Mutex<Option<Maintainer>> // background flush + compact thread   │ │    │
│  │  └──────────────────────────────────────────────────────────────────────────────┘ │    │
│  └────────────────────────────────────────────────────────────────────────────────────┘    │
│  upsert/try_add/force_delete/try_get; forward_iter/reverse_iter over a merged snapshot       │
└───────────────────────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────────── KEY ENCODING LAYER ───────────────────────────────────────┐
│                                                                                               │
│  struct PositionalKey<R, T=u64> { token, record, prev_token }  ── big-endian, Ord matches key │
│  struct ReverseKey<R, T=u64>    { record, token }                                            │
│  trait FixedKey: Copy + Ord + Send + Sync + 'static                                          │
└───────────────────────────────────────────────────────────────────────────────────────────────┘
*/
