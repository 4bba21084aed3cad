//! Help text.

/// Text printed by `help` and `-h`.
pub const USAGE: &str = "\
clawctl [<OPTION>] [<COMMAND>]
    Valid <OPTION> values are:
     -a or --all: equivalent to \"all\" command
     -h or --help: equivalent to \"help\" command
     --hide: equivalent to \"hide\" command
     -o or --oneliner: equivalent to \"oneliner\" command
     -q or --quiet: equivalent to \"quiet\" command
     -v or --verbose: equivalent to \"verbose\" command
     -V or --version: equivalent to \"version\" command
     --controller <URL>: primary controller (env CLAWCTL_CONTROLLER)
     --backup-controller <URL>: backup controller (env CLAWCTL_BACKUP_CONTROLLER)
     --timeout <SECS>: controller request timeout

  <COMMAND> may be omitted from the command line and clawctl will run in
  interactive mode, processing commands until explicitly terminated.

    Valid <COMMAND> values are:
     abort                    stop the controller immediately, leaving a core
                              file.
     all                      show all partitions, including hidden ones.
     checkpoint <OP> <STEP>   perform a checkpoint operation on a job step.
     completing               list jobs in completing state with their
                              completing or down nodes.
     delete <SPECIFICATIONS>  delete the given partition and kill its jobs.
     exit                     terminate clawctl.
     help                     print this description of use.
     hide                     do not show hidden partitions.
     oneliner                 print one record per line.
     pidinfo <pid>            show the job owning a local process.
     ping                     report the state of the primary and backup
                              controllers.
     quiet                    print no messages other than usage errors.
     quit                     terminate clawctl.
     reconfigure              make the controller re-read its configuration.
     requeue <job_id>         requeue a batch job.
     resume <job_id>          resume a suspended job.
     show <ENTITY> [<ID>]     show the state of an entity, all records by
                              default.
     shutdown                 stop the controller.
     suspend <job_id>         suspend a running job.
     update <SPECIFICATIONS>  update a job, node, partition or block.
     verbose                  report more detail.
     version                  print the clawctl version.
     !!                       repeat the last command.

  <ENTITY> may be \"config\", \"jobs\", \"nodes\", \"partitions\", \"steps\" or
  \"blocks\", abbreviated to three letters.

  <ID> is a configuration parameter name, job id, node name, partition name,
  block name or job step id (<job_id>.<step>).

  <SPECIFICATIONS> use the Keyword=value syntax of the configuration file; the
  output of \"show\" can be edited and fed back to \"update\". Node names accept
  range expressions such as lx[10-20]. Blocks can only be set to ERROR or FREE.

  <OP> is one of \"able\", \"disable\", \"enable\", \"create\", \"vacate\",
  \"restart\" or \"error\".

  Commands and options are case-insensitive; node and partition names are not.
";
