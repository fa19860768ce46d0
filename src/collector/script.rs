//! D script generation.
//!
//! The script keeps a per-thread stack of open call ids, numbers calls in
//! entry order within a run and prints the two line shapes the parser
//! understands. It exits once `num_runs` root calls have returned.

use super::config::CollectorConfig;

const SCRIPT_TEMPLATE: &str = r#"#!/usr/sbin/dtrace -s

#pragma D option quiet
#pragma D option defaultargs

self int in;        /* inside a traced run */
self int rid;       /* run id of the current run */
self int depth;     /* current call depth */
self int next_cid;  /* next call id to hand out */
self int top;       /* index of the innermost open call */
self int stack[int];
self uint64_t start[int];

int next_run;
int runs_left;

BEGIN
{
  next_run = 0;
  runs_left = @NUM_RUNS@;
}

fbt:@MODULE@:@FUNC@:entry
/!self->in/
{
  self->in = 1;
  self->rid = next_run++;
  self->top = 0;
  self->stack[0] = 0;
  self->start[0] = timestamp;
  printf("%s %d %d %d %d %d\n", probefunc, self->rid, 0, tid, 0, self->start[0]);
  self->depth = 1;
  self->next_cid = 1;
}

fbt:::entry
/self->in && probefunc != "@FUNC@"/
{
  this->cid = self->next_cid++;
  self->stack[++self->top] = this->cid;
  self->start[this->cid] = timestamp;
  printf("%s %d %d %d %d %d\n", probefunc, self->rid, this->cid, tid, self->depth, self->start[this->cid]);
  self->depth++;
}

fbt:::return
/self->in && probefunc != "@FUNC@"/
{
  self->depth--;
  this->cid = self->stack[self->top];
  self->stack[self->top--] = 0;
  printf("%s %d %d %d\n", probefunc, self->rid, this->cid, timestamp - self->start[this->cid]);
  self->start[this->cid] = 0;
}

fbt:@MODULE@:@FUNC@:return
/self->in/
{
  printf("%s %d %d %d\n", probefunc, self->rid, 0, timestamp - self->start[0]);
  self->start[0] = 0;
  self->stack[0] = 0;
  self->in = 0;
  runs_left--;
}

fbt:@MODULE@:@FUNC@:return
/runs_left == 0/
{
  exit(0);
}
"#;

/// Render the D script for a validated config
pub fn render_script(config: &CollectorConfig) -> String {
    SCRIPT_TEMPLATE
        .replace("@FUNC@", &config.target_function)
        .replace("@MODULE@", &config.module)
        .replace("@NUM_RUNS@", &config.num_runs.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_substituted() {
        let config = CollectorConfig::new("vn_open")
            .with_module("mach_kernel")
            .with_num_runs(3);
        let script = render_script(&config);

        assert!(!script.contains('@'));
        assert!(script.contains("fbt:mach_kernel:vn_open:entry"));
        assert!(script.contains("probefunc != \"vn_open\""));
        assert!(script.contains("runs_left = 3;"));
    }

    #[test]
    fn test_empty_module_matches_any() {
        let script = render_script(&CollectorConfig::new("foo"));
        assert!(script.contains("fbt::foo:entry"));
        assert!(script.contains("fbt::foo:return"));
    }

    #[test]
    fn test_returns_release_per_call_slots() {
        let script = render_script(&CollectorConfig::new("foo"));
        assert!(script.contains("self->start[this->cid] = 0;"));
        assert!(script.contains("self->stack[self->top--] = 0;"));
        assert!(script.contains("self->start[0] = 0;"));
    }
}
