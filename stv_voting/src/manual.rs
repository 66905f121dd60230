/*!

This is the long-form manual for `stv_voting` and `stvtab`.

## Counting rules

The count uses the Droop quota, computed once from the number of ballots:

```text
quota = floor(ballots / (seats + 1)) + 1
```

Each round does exactly one of the following:
1. The first candidate (in ranking order, lowest first) holding at least the
   quota is seated. The first `quota` ballots it received are spent. The
   ballots it received after that are the surplus and move to their next
   preference that is still running.
2. Otherwise, the candidates tied for last place are considered. Candidates
   are ranked by current votes and then by the number of ballots that mention
   them anywhere, fewer meaning lower.
   - If all of them can lose while leaving enough candidates for the open
     seats, they are eliminated and their ballots move on.
   - If the candidates left do not outnumber the open seats, they are all
     seated and any seat still open is `Vacant`.
   - Otherwise the open seats are `Tied` and a runoff is required.

If there are no more candidates than seats before the count starts, every
candidate is seated in registration order and the remaining seats are
`Vacant`.

## Input formats

The following formats are supported:
* `text` plain text, one ballot per line
* `csv` Comma Separated Values
* `xlsx` Excel workbooks

### `text`

The first line is an instruction line for the voters and is ignored. Every
following line is one ballot, with the candidates separated by commas:

```text
Rank the candidates, separated by commas
Alice, Bob
Bob, Clara, Alice
Clara
```

The candidates file has the same layout, with all the names on the lines after
the instruction line.

Names that are not candidates are dropped from the ballot with a warning.

### `csv`

Simple CSV reader. Each column (in order) is considered to be a choice. The name of the choice in the header is not significant.

```text
id,count,choice 1,choice 2,choice 3,choice 4
id1,20,A,B,C,D
id2,20,A,C,B,D
```

The `id` and `count` columns are optional. Headers in the first row is optional.
See the [Configuration section](#configuration) on controling the optional rows and columns.

### `xlsx`

The first worksheet (or the worksheet named by `excelWorksheetName`) is read.
The first row is a header. Choices start at `firstVoteColumnIndex`, empty cells
are skipped.

## Configuration

`stvtab` accepts a configuration file in JSON:

```json
{
  "outputSettings": {
    "contestName": "Board election",
    "winnersFile": "winners.txt"
  },
  "cvrFileSources": [
    { "provider": "csv", "filePath": "ballots.csv",
      "firstVoteColumnIndex": 3, "firstVoteRowIndex": 2,
      "idColumnIndex": 1, "countColumnIndex": 2 }
  ],
  "candidates": [ { "name": "A" }, { "name": "B" }, { "name": "C" } ],
  "rules": { "numberOfWinners": 2 }
}
```

Paths are relative to the configuration file. Candidates marked as
`"excluded": true` are removed before the count. A candidate with a `code`
can be written on the ballots either by name or by code. A code may not be the
name or the code of another candidate.

It also accepts the settings file of older installations (`--settings`): four
`name = value` lines giving, in this order, the number of seats, the
candidates file, the ballots file and the file to write the winners to. When
no source is given on the command line, `settings.txt` in the current directory
is used if it exists.

## Output

The winners are written one seat per line:

```text
1st seat: Alice
2nd seat: Vacant
```

If the count ended on an unbreakable tie, the report starts with a line
stating that a runoff must be held, and the undecided seats read `Tied`.

With `--out`, a JSON summary of every round (tally, eliminations, surplus
transfers) is written as well.

 */
